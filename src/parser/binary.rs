//! The binary parser handles the parsing and generation of the Ontology in
//! binary format.
//! Old binary versions are always supported as input, but only the newest
//! version is generated. Files written by older releases stay readable,
//! clients pick up the new layout the next time they save.
//!
//! # Layout
//!
//! A file consists of a fixed size [`header::Header`] followed by six
//! sections, always in this order:
//!
//! 1. Identifier table (see [`crate::strings::StringTable`])
//! 2. Tag-value table
//! 3. Child edges
//! 4. Parent edges (`is_a` followed by `part_of` per term)
//! 5. Alt-id edges
//! 6. Term records (see [`term::BinaryTerm`])
//!
//! Edges are identifier handles as big-endian `u32`. All numbers of the
//! format are big-endian, regardless of the host.
use std::fmt::Display;

use crate::{u32_from_bytes, GoError};

pub(crate) mod header;
pub(crate) mod term;

/// Magic bytes at the start of every file
pub(crate) const MAGIC: [u8; 4] = *b"GOTS";

/// The only format type so far: an ontology term store
pub(crate) const FORMAT_TYPE: u32 = 1;

/// Marker for missing optional handles
pub(crate) const NONE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum BinaryVersion {
    /// Terms without namespace, definition and replacement
    V1,
    V2,
}

impl BinaryVersion {
    /// The version written by this crate
    pub const CURRENT: BinaryVersion = BinaryVersion::V2;

    pub fn as_u32(self) -> u32 {
        match self {
            BinaryVersion::V1 => 1,
            BinaryVersion::V2 => 2,
        }
    }
}

impl TryFrom<u32> for BinaryVersion {
    type Error = GoError;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1u32 => Ok(BinaryVersion::V1),
            2u32 => Ok(BinaryVersion::V2),
            _ => Err(GoError::UnsupportedVersion(value)),
        }
    }
}

impl Display for BinaryVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Bytes<'a> {
    data: &'a [u8],
    version: BinaryVersion,
}

impl<'a> Bytes<'a> {
    pub fn new(data: &'a [u8], version: BinaryVersion) -> Self {
        Self { data, version }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn subset<T>(&self, idx: T) -> Bytes<'a>
    where
        T: std::slice::SliceIndex<[u8], Output = [u8]>,
    {
        Bytes::new(&self.data[idx], self.version)
    }

    pub fn version(&self) -> BinaryVersion {
        self.version
    }

    /// Returns the big-endian `u32` at byte offset `idx`
    ///
    /// # Panics
    ///
    /// Panics if fewer than 4 bytes are left after `idx`
    pub fn u32_at(&self, idx: usize) -> u32 {
        assert!(
            self.len() >= idx + 4,
            "4 bytes are required to extract u32"
        );
        u32_from_bytes(&self.data[idx..])
    }

    /// Iterates the data as big-endian `u32`s
    pub fn u32_iter(&self) -> impl Iterator<Item = u32> + 'a {
        self.data.chunks_exact(4).map(u32_from_bytes)
    }
}

impl<Idx> std::ops::Index<Idx> for Bytes<'_>
where
    Idx: std::slice::SliceIndex<[u8]>,
{
    type Output = Idx::Output;

    fn index(&self, idx: Idx) -> &Self::Output {
        &self.data[idx]
    }
}

/// Returns `None` for the [`NONE`] marker
pub(crate) fn optional(value: u32) -> Option<u32> {
    if value == NONE {
        None
    } else {
        Some(value)
    }
}
