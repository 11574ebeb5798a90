//! Small helpers shared by the string tables and the term arena
use std::cmp::Ordering;

/// 16 bit hash of a byte string
///
/// FNV-1a, folded from 32 to 16 bits
pub(crate) fn hash16(bytes: &[u8]) -> u16 {
    let mut hash: u32 = 0x811c_9dc5;
    for b in bytes {
        hash ^= u32::from(*b);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    ((hash >> 16) ^ (hash & 0xffff)) as u16
}

/// Orders two identifiers case-insensitively
///
/// Identifiers that only differ in case are ordered bytewise, so that
/// the ordering is total and a binary search finds exactly one term.
pub(crate) fn cmp_ids(a: &[u8], b: &[u8]) -> Ordering {
    let folded = a
        .iter()
        .map(u8::to_ascii_lowercase)
        .cmp(b.iter().map(u8::to_ascii_lowercase));
    folded.then_with(|| a.cmp(b))
}
