//! The fixed size file header
//!
//! The header is 112 bytes long, every field is a big-endian `u32`:
//!
//! | Byte offset | Number of bytes | Description |
//! | --- | --- | --- |
//! | 0 | 4 | Magic bytes `GOTS` |
//! | 4 | 4 | Format type, always `1` |
//! | 8 | 4 | Binary version |
//! | 12 | 4 | Size of the header |
//! | 16 | 4 | Total length of the file |
//! | 20 | 20 | Sequential ids of the five root terms, `0` if absent |
//! | 40 | 72 | Six sections of `{count, byte size, byte offset}` |
use tracing::trace;

use super::{BinaryVersion, FORMAT_TYPE, MAGIC};
use crate::{u32_from_bytes, GoError, GoResult};

/// Size of the header in bytes
pub(crate) const HEADER_SIZE: usize = 112;

/// Number of root ids in the header
const NUM_ROOTS: usize = 5;

/// The data sections, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionKind {
    Identifiers,
    TagValues,
    ChildEdges,
    ParentEdges,
    AltIdEdges,
    Terms,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Identifiers,
        SectionKind::TagValues,
        SectionKind::ChildEdges,
        SectionKind::ParentEdges,
        SectionKind::AltIdEdges,
        SectionKind::Terms,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SectionKind::Identifiers => "identifiers",
            SectionKind::TagValues => "tag values",
            SectionKind::ChildEdges => "child edges",
            SectionKind::ParentEdges => "parent edges",
            SectionKind::AltIdEdges => "alt-id edges",
            SectionKind::Terms => "terms",
        }
    }

    fn index(self) -> usize {
        match self {
            SectionKind::Identifiers => 0,
            SectionKind::TagValues => 1,
            SectionKind::ChildEdges => 2,
            SectionKind::ParentEdges => 3,
            SectionKind::AltIdEdges => 4,
            SectionKind::Terms => 5,
        }
    }
}

/// Position and size of a section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Section {
    /// Number of entries
    pub count: u32,
    /// Number of bytes
    pub size: u32,
    /// Byte offset from the start of the file
    pub offset: u32,
}

impl Section {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset as usize..self.offset as usize + self.size as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub version: BinaryVersion,
    pub file_len: u32,
    /// Sequential term ids of the roots, in [`crate::RootOntology::ROOTS`] order
    pub roots: [u32; NUM_ROOTS],
    sections: [Section; 6],
}

impl Header {
    pub fn new(version: BinaryVersion) -> Self {
        Self {
            version,
            file_len: 0,
            roots: [0; NUM_ROOTS],
            sections: [Section::default(); 6],
        }
    }

    pub fn section(&self, kind: SectionKind) -> Section {
        self.sections[kind.index()]
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        &mut self.sections[kind.index()]
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let mut res = Vec::with_capacity(HEADER_SIZE);
        res.extend_from_slice(&MAGIC);
        res.extend_from_slice(&FORMAT_TYPE.to_be_bytes());
        res.extend_from_slice(&self.version.as_u32().to_be_bytes());
        // HEADER_SIZE is a small constant
        res.extend_from_slice(&(HEADER_SIZE as u32).to_be_bytes());
        res.extend_from_slice(&self.file_len.to_be_bytes());
        for root in self.roots {
            res.extend_from_slice(&root.to_be_bytes());
        }
        for section in &self.sections {
            res.extend_from_slice(&section.count.to_be_bytes());
            res.extend_from_slice(&section.size.to_be_bytes());
            res.extend_from_slice(&section.offset.to_be_bytes());
        }
        res
    }

    /// Reads and validates the header
    ///
    /// Besides the header fields, this checks that the file length matches
    /// `bytes` and that every section lies within the data.
    ///
    /// # Errors
    ///
    /// - [`GoError::NotThisFormat`]: wrong magic bytes or format type
    /// - [`GoError::UnsupportedVersion`]: unknown version
    /// - [`GoError::Truncated`]: the data is shorter than the header claims
    /// - [`GoError::CorruptBinary`]: inconsistent sizes or offsets
    pub fn from_bytes(bytes: &[u8]) -> GoResult<Self> {
        if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
            return Err(GoError::NotThisFormat);
        }
        if bytes.len() < HEADER_SIZE {
            return Err(GoError::Truncated("header"));
        }
        if u32_from_bytes(&bytes[4..]) != FORMAT_TYPE {
            return Err(GoError::NotThisFormat);
        }
        let version = BinaryVersion::try_from(u32_from_bytes(&bytes[8..]))?;
        if u32_from_bytes(&bytes[12..]) as usize != HEADER_SIZE {
            return Err(GoError::CorruptBinary("header size"));
        }

        let mut header = Header::new(version);
        header.file_len = u32_from_bytes(&bytes[16..]);
        match (header.file_len as usize).cmp(&bytes.len()) {
            std::cmp::Ordering::Greater => return Err(GoError::Truncated("file")),
            std::cmp::Ordering::Less => return Err(GoError::CorruptBinary("file length")),
            std::cmp::Ordering::Equal => (),
        }

        for (idx, root) in header.roots.iter_mut().enumerate() {
            *root = u32_from_bytes(&bytes[20 + idx * 4..]);
        }

        let mut expected_offset = HEADER_SIZE;
        for kind in SectionKind::ALL {
            let start = 40 + kind.index() * 12;
            let section = Section {
                count: u32_from_bytes(&bytes[start..]),
                size: u32_from_bytes(&bytes[start + 4..]),
                offset: u32_from_bytes(&bytes[start + 8..]),
            };
            if section.offset as usize != expected_offset {
                return Err(GoError::CorruptBinary("section offset"));
            }
            if section.range().end > bytes.len() {
                return Err(GoError::Truncated(kind.name()));
            }
            trace!(
                "Section {}: {} entries, {} bytes at {}",
                kind.name(),
                section.count,
                section.size,
                section.offset
            );
            expected_offset = section.range().end;
            *header.section_mut(kind) = section;
        }
        if expected_offset != bytes.len() {
            return Err(GoError::CorruptBinary("trailing data"));
        }
        Ok(header)
    }
}
