//! Term records of the binary format
//!
//! A record references strings by their handle and edges by their position
//! in the edge sections, so every record of a version has the same size.

use super::{optional, BinaryVersion, Bytes, NONE};
use crate::{GoError, GoResult};

/// Bit of the flags byte for obsolete terms
const FLAG_OBSOLETE: u8 = 1;
/// Bit of the flags byte for terms that can't be classified
const FLAG_NO_CLASS: u8 = 2;

/// A range of the alt-id, parent or child edge section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct EdgeRange {
    pub start: u32,
    pub count: u32,
}

impl EdgeRange {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.start as usize + self.count as usize
    }
}

/// A term as stored in the binary format
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BinaryTerm {
    pub own_id: u32,
    pub seq: u32,
    pub name: Option<u32>,
    pub namespace: Option<u32>,
    pub definition: Option<u32>,
    pub replaced_by: Option<u32>,
    pub obsolete: bool,
    pub no_class: bool,
    pub root: u8,
    pub alt_ids: EdgeRange,
    /// All parents, `is_a` first
    pub parents: EdgeRange,
    /// Number of `is_a` parents at the start of `parents`
    pub is_a_count: u32,
    pub children: EdgeRange,
}

impl BinaryTerm {
    /// Size of a record in bytes
    pub fn record_len(version: BinaryVersion) -> usize {
        match version {
            BinaryVersion::V1 => 44,
            BinaryVersion::V2 => 56,
        }
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.obsolete {
            flags |= FLAG_OBSOLETE;
        }
        if self.no_class {
            flags |= FLAG_NO_CLASS;
        }
        flags
    }

    /// Appends the record in the current version to `buffer`
    ///
    /// The binary layout is defined as:
    ///
    /// | Byte offset | Number of bytes | Description |
    /// | --- | --- | --- |
    /// | 0 | 4 | Handle of the identifier |
    /// | 4 | 4 | Sequential id |
    /// | 8 | 4 | Handle of the name or `u32::MAX` |
    /// | 12 | 4 | Handle of the namespace or `u32::MAX` |
    /// | 16 | 4 | Handle of the definition or `u32::MAX` |
    /// | 20 | 4 | Identifier handle of the replacement or `u32::MAX` |
    /// | 24 | 1 | Flags: `1` obsolete, `2` unclassified |
    /// | 25 | 1 | Root ontology |
    /// | 26 | 2 | Padding |
    /// | 28 | 8 | Start and number of alt-ids |
    /// | 36 | 12 | Start of the parents, number of `is_a` and of `part_of` parents |
    /// | 48 | 8 | Start and number of children |
    ///
    /// All numbers are big-endian `u32`.
    pub fn write(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.own_id.to_be_bytes());
        buffer.extend_from_slice(&self.seq.to_be_bytes());
        for handle in [
            self.name,
            self.namespace,
            self.definition,
            self.replaced_by,
        ] {
            buffer.extend_from_slice(&handle.unwrap_or(NONE).to_be_bytes());
        }
        buffer.extend_from_slice(&[self.flags(), self.root, 0, 0]);
        self.write_edges(buffer);
    }

    fn write_edges(&self, buffer: &mut Vec<u8>) {
        let part_of_count = self.parents.count - self.is_a_count;
        for value in [
            self.alt_ids.start,
            self.alt_ids.count,
            self.parents.start,
            self.is_a_count,
            part_of_count,
            self.children.start,
            self.children.count,
        ] {
            buffer.extend_from_slice(&value.to_be_bytes());
        }
    }

    /// Reads the record of the version of `bytes`
    pub fn from_bytes(bytes: Bytes) -> GoResult<Self> {
        match bytes.version() {
            BinaryVersion::V1 => from_bytes_v1(bytes),
            BinaryVersion::V2 => from_bytes_v2(bytes),
        }
    }
}

/// Reads the seven edge fields starting at `offset`
fn edges_from_bytes(bytes: Bytes, offset: usize, term: &mut BinaryTerm) -> GoResult<()> {
    term.alt_ids = EdgeRange {
        start: bytes.u32_at(offset),
        count: bytes.u32_at(offset + 4),
    };
    term.is_a_count = bytes.u32_at(offset + 12);
    let part_of_count = bytes.u32_at(offset + 16);
    term.parents = EdgeRange {
        start: bytes.u32_at(offset + 8),
        count: term
            .is_a_count
            .checked_add(part_of_count)
            .ok_or(GoError::CorruptBinary("parent count"))?,
    };
    term.children = EdgeRange {
        start: bytes.u32_at(offset + 20),
        count: bytes.u32_at(offset + 24),
    };
    Ok(())
}

fn flags_from_byte(flags: u8, term: &mut BinaryTerm) -> GoResult<()> {
    if flags & !(FLAG_OBSOLETE | FLAG_NO_CLASS) != 0 {
        return Err(GoError::CorruptBinary("unknown term flags"));
    }
    term.obsolete = flags & FLAG_OBSOLETE != 0;
    term.no_class = flags & FLAG_NO_CLASS != 0;
    Ok(())
}

/// Creates a `BinaryTerm` from a version 1 record
///
/// | Byte offset | Number of bytes | Description |
/// | --- | --- | --- |
/// | 0 | 4 | Handle of the identifier |
/// | 4 | 4 | Sequential id |
/// | 8 | 4 | Handle of the name or `u32::MAX` |
/// | 12 | 1 | Flags |
/// | 13 | 1 | Root ontology |
/// | 14 | 2 | Padding |
/// | 16 | 28 | Edges, as in version 2 |
pub(crate) fn from_bytes_v1(bytes: Bytes) -> GoResult<BinaryTerm> {
    if bytes.len() < BinaryTerm::record_len(BinaryVersion::V1) {
        return Err(GoError::Truncated("terms"));
    }
    let mut term = BinaryTerm {
        own_id: bytes.u32_at(0),
        seq: bytes.u32_at(4),
        name: optional(bytes.u32_at(8)),
        root: bytes[13],
        ..Default::default()
    };
    flags_from_byte(bytes[12], &mut term)?;
    edges_from_bytes(bytes, 16, &mut term)?;
    Ok(term)
}

/// Creates a `BinaryTerm` from a version 2 record
///
/// See [`BinaryTerm::write`] for the layout
pub(crate) fn from_bytes_v2(bytes: Bytes) -> GoResult<BinaryTerm> {
    if bytes.len() < BinaryTerm::record_len(BinaryVersion::V2) {
        return Err(GoError::Truncated("terms"));
    }
    let mut term = BinaryTerm {
        own_id: bytes.u32_at(0),
        seq: bytes.u32_at(4),
        name: optional(bytes.u32_at(8)),
        namespace: optional(bytes.u32_at(12)),
        definition: optional(bytes.u32_at(16)),
        replaced_by: optional(bytes.u32_at(20)),
        root: bytes[25],
        ..Default::default()
    };
    flags_from_byte(bytes[24], &mut term)?;
    edges_from_bytes(bytes, 28, &mut term)?;
    Ok(term)
}

/// Iterator of the records of the term section
pub(crate) struct BinaryTermBuilder<'a> {
    bytes: Bytes<'a>,
    offset: usize,
}

impl<'a> BinaryTermBuilder<'a> {
    pub fn new(bytes: Bytes<'a>) -> Self {
        Self { bytes, offset: 0 }
    }
}

impl Iterator for BinaryTermBuilder<'_> {
    type Item = GoResult<BinaryTerm>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.bytes.len() {
            return None;
        }
        let record_len = BinaryTerm::record_len(self.bytes.version());
        let end = (self.offset + record_len).min(self.bytes.len());
        let record = self.bytes.subset(self.offset..end);
        self.offset += record_len;
        Some(BinaryTerm::from_bytes(record))
    }
}
