//! Interned, append-only string tables
//!
//! The term store keeps two tables: one for term identifiers and one for
//! free-text tag values (names, namespaces, definitions). Every distinct
//! byte string is stored exactly once and referenced by a [`StrHandle`].
//!
//! # Layout
//!
//! The table is a single growable byte buffer of consecutive entries:
//!
//! | Byte offset | Number of bytes | Description |
//! | --- | --- | --- |
//! | 0 | 2 | 16 bit hash of the content as big-endian `u16` |
//! | 2 | 2 | Length of the content as big-endian `u16` |
//! | 4 | n | The content |
//!
//! A [`StrHandle`] is the byte offset of an entry. The buffer may be
//! reallocated when it grows, so handles are the only way to refer to
//! an entry. The same layout is used in the binary file.
use std::collections::HashMap;
use std::fmt::Display;

use smallvec::SmallVec;
use tracing::trace;

use crate::utils::hash16;
use crate::{u16_from_bytes, GoError, GoResult};

/// Size of the hash + length prefix of every entry
const ENTRY_HEADER: usize = 4;

/// Minimum number of bytes the table grows by
const GROW_INCREMENT: usize = 64 * 1024;

/// Stable reference to an entry of a [`StringTable`]
///
/// The handle is the byte offset of the entry inside its table.
/// It is only meaningful together with the table that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrHandle(u32);

impl StrHandle {
    /// Returns the byte offset of the entry
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for StrHandle {
    fn from(offset: u32) -> Self {
        Self(offset)
    }
}

impl Display for StrHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A deduplicating string table
///
/// # Examples
///
/// ```
/// use goterms::strings::StringTable;
///
/// let mut table = StringTable::default();
/// let a = table.intern(b"GO:0008150").unwrap();
/// let b = table.intern(b"GO:0008150").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(table.resolve(a), b"GO:0008150");
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct StringTable {
    data: Vec<u8>,
    buckets: HashMap<u16, SmallVec<[StrHandle; 2]>>,
    len: usize,
}

impl StringTable {
    /// Constructs an empty table with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            buckets: HashMap::new(),
            len: 0,
        }
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of bytes used by all entries
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Returns the handle of `bytes`, adding it to the table if needed
    ///
    /// # Errors
    ///
    /// - [`GoError::ValueTooLong`]: `bytes` is longer than `u16::MAX`
    /// - [`GoError::Allocation`]: the table cannot grow
    /// - [`GoError::TryFromIntError`]: the table exceeds `u32::MAX` bytes
    pub fn intern(&mut self, bytes: &[u8]) -> GoResult<StrHandle> {
        let hash = hash16(bytes);
        if let Some(handle) = self.find_hashed(hash, bytes) {
            return Ok(handle);
        }

        let Ok(len) = u16::try_from(bytes.len()) else {
            return Err(GoError::ValueTooLong(bytes.len()));
        };

        self.reserve(ENTRY_HEADER + bytes.len())?;
        let handle = StrHandle(u32::try_from(self.data.len())?);
        self.data.extend_from_slice(&hash.to_be_bytes());
        self.data.extend_from_slice(&len.to_be_bytes());
        self.data.extend_from_slice(bytes);

        self.buckets.entry(hash).or_default().push(handle);
        self.len += 1;
        Ok(handle)
    }

    /// Shortcut for [`StringTable::intern`] with a `&str`
    ///
    /// # Errors
    ///
    /// See [`StringTable::intern`]
    pub fn intern_str(&mut self, s: &str) -> GoResult<StrHandle> {
        self.intern(s.as_bytes())
    }

    /// Returns the handle of `bytes` if it is present
    pub fn find(&self, bytes: &[u8]) -> Option<StrHandle> {
        self.find_hashed(hash16(bytes), bytes)
    }

    /// Returns the content of the entry
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this table
    pub fn resolve(&self, handle: StrHandle) -> &[u8] {
        self.get(handle)
            .expect("handles are only issued by the owning table")
    }

    /// Returns the content of the entry as `&str`
    ///
    /// Entries that are not valid UTF-8 resolve to an empty string
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this table
    pub fn resolve_str(&self, handle: StrHandle) -> &str {
        std::str::from_utf8(self.resolve(handle)).unwrap_or_default()
    }

    /// Returns the content of the entry or `None` if the handle
    /// does not point to an entry
    pub fn get(&self, handle: StrHandle) -> Option<&[u8]> {
        let start = handle.0 as usize;
        if start + ENTRY_HEADER > self.data.len() {
            return None;
        }
        let hash = u16_from_bytes(&self.data[start..]);
        if !self
            .buckets
            .get(&hash)
            .is_some_and(|bucket| bucket.contains(&handle))
        {
            return None;
        }
        let len = u16_from_bytes(&self.data[start + 2..]) as usize;
        Some(&self.data[start + ENTRY_HEADER..start + ENTRY_HEADER + len])
    }

    /// Returns `true` if the handle points to an entry of this table
    pub fn contains(&self, handle: StrHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Returns the raw bytes of the table in the binary layout
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Rebuilds a table from its raw bytes
    ///
    /// `count` is the number of entries the caller expects.
    ///
    /// # Errors
    ///
    /// - [`GoError::Truncated`]: an entry extends past the end of the data
    /// - [`GoError::CorruptBinary`]: hashes or the number of entries do not match,
    ///   or the data contains duplicate entries
    /// - [`GoError::Allocation`]: the table cannot be allocated
    pub fn from_bytes(bytes: &[u8], count: usize) -> GoResult<Self> {
        if count > bytes.len() / ENTRY_HEADER {
            return Err(GoError::CorruptBinary("string table entry count"));
        }
        let mut data = Vec::new();
        data.try_reserve_exact(bytes.len())?;
        data.extend_from_slice(bytes);

        let mut table = Self {
            data,
            buckets: HashMap::with_capacity(count),
            len: 0,
        };

        let mut idx = 0usize;
        while idx < bytes.len() {
            if idx + ENTRY_HEADER > bytes.len() {
                return Err(GoError::Truncated("string table"));
            }
            let hash = u16_from_bytes(&bytes[idx..]);
            let len = u16_from_bytes(&bytes[idx + 2..]) as usize;
            let end = idx + ENTRY_HEADER + len;
            if end > bytes.len() {
                return Err(GoError::Truncated("string table"));
            }
            let content = &bytes[idx + ENTRY_HEADER..end];
            if hash16(content) != hash {
                return Err(GoError::CorruptBinary("string table hash mismatch"));
            }
            if table.find_hashed(hash, content).is_some() {
                return Err(GoError::CorruptBinary("duplicate string table entry"));
            }
            table
                .buckets
                .entry(hash)
                .or_default()
                .push(StrHandle(u32::try_from(idx)?));
            table.len += 1;
            idx = end;
        }

        if table.len != count {
            return Err(GoError::CorruptBinary("string table entry count"));
        }
        trace!("Loaded string table with {} entries", table.len);
        Ok(table)
    }

    /// Removes all entries, keeping the allocated buffer
    pub fn clear(&mut self) {
        self.data.clear();
        self.buckets.clear();
        self.len = 0;
    }

    fn find_hashed(&self, hash: u16, bytes: &[u8]) -> Option<StrHandle> {
        self.buckets.get(&hash)?.iter().copied().find(|handle| {
            let start = handle.0 as usize;
            let len = u16_from_bytes(&self.data[start + 2..]) as usize;
            len == bytes.len() && &self.data[start + ENTRY_HEADER..start + ENTRY_HEADER + len] == bytes
        })
    }

    /// Makes room for `additional` bytes
    ///
    /// The buffer doubles, but grows at least by `GROW_INCREMENT`
    fn reserve(&mut self, additional: usize) -> GoResult<()> {
        let free = self.data.capacity() - self.data.len();
        if free >= additional {
            return Ok(());
        }
        let grow = self.data.capacity().max(GROW_INCREMENT).max(additional);
        self.data.try_reserve_exact(grow)?;
        trace!("String table grown to {} bytes", self.data.capacity());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut table = StringTable::default();
        let a = table.intern(b"GO:0000001").unwrap();
        let b = table.intern(b"GO:0000002").unwrap();
        let c = table.intern(b"GO:0000001").unwrap();
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(a), b"GO:0000001");
        assert_eq!(table.resolve_str(b), "GO:0000002");
    }

    #[test]
    fn handles_are_byte_offsets() {
        let mut table = StringTable::default();
        let a = table.intern(b"abc").unwrap();
        let b = table.intern(b"de").unwrap();
        assert_eq!(a.as_u32(), 0);
        assert_eq!(b.as_u32(), 7);
        assert_eq!(table.byte_len(), 13);
    }

    #[test]
    fn empty_string() {
        let mut table = StringTable::default();
        let a = table.intern(b"").unwrap();
        assert_eq!(table.resolve(a), b"");
        assert_eq!(table.intern(b"").unwrap(), a);
    }

    #[test]
    fn handles_survive_growth() {
        let mut table = StringTable::with_capacity(8);
        let first = table.intern(b"first").unwrap();
        let handles: Vec<StrHandle> = (0..5_000)
            .map(|i| table.intern(format!("GO:{i:07}").as_bytes()).unwrap())
            .collect();
        assert_eq!(table.resolve(first), b"first");
        assert_eq!(table.resolve_str(handles[4_321]), "GO:0004321");
        assert_eq!(table.len(), 5_001);
    }

    #[test]
    fn too_long() {
        let mut table = StringTable::default();
        let long = vec![b'a'; 70_000];
        assert!(matches!(
            table.intern(&long),
            Err(GoError::ValueTooLong(70_000))
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn invalid_handle() {
        let mut table = StringTable::default();
        table.intern(b"abc").unwrap();
        assert!(table.get(StrHandle::from(1)).is_none());
        assert!(table.get(StrHandle::from(100)).is_none());
        assert!(table.contains(StrHandle::from(0)));
    }

    #[test]
    fn bytes_roundtrip() {
        let mut table = StringTable::default();
        let a = table.intern(b"biological_process").unwrap();
        let b = table.intern(b"cellular_component").unwrap();

        let copy = StringTable::from_bytes(table.as_bytes(), 2).unwrap();
        assert_eq!(copy.resolve(a), b"biological_process");
        assert_eq!(copy.resolve(b), b"cellular_component");
        assert_eq!(copy.find(b"cellular_component"), Some(b));
    }

    #[test]
    fn from_bytes_rejects_impossible_count() {
        let mut table = StringTable::default();
        table.intern(b"GO:0008150").unwrap();
        assert!(matches!(
            StringTable::from_bytes(table.as_bytes(), usize::MAX),
            Err(GoError::CorruptBinary("string table entry count"))
        ));
        assert!(matches!(
            StringTable::from_bytes(&[], 1),
            Err(GoError::CorruptBinary(_))
        ));
        assert!(StringTable::from_bytes(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn from_bytes_rejects_bad_data() {
        let mut table = StringTable::default();
        table.intern(b"biological_process").unwrap();
        let bytes = table.as_bytes().to_vec();

        assert!(matches!(
            StringTable::from_bytes(&bytes[..10], 1),
            Err(GoError::Truncated(_))
        ));
        assert!(matches!(
            StringTable::from_bytes(&bytes, 2),
            Err(GoError::CorruptBinary(_))
        ));

        let mut corrupt = bytes.clone();
        corrupt[5] = b'x';
        assert!(matches!(
            StringTable::from_bytes(&corrupt, 1),
            Err(GoError::CorruptBinary(_))
        ));
    }
}
