#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
use core::fmt::Debug;
use std::collections::TryReserveError;
use std::num::TryFromIntError;
use thiserror::Error;

pub mod parser;
pub mod stats;
pub mod strings;
pub mod term;
mod ontology;
mod utils;

pub use ontology::{Iter, Ontology};
pub use parser::ParserOptions;
pub use term::{GoTerm, RootOntology, TermId};

/// Initial capacity of the term arena
const DEFAULT_NUM_TERMS: usize = 1_000;
/// Inline capacity of the parent, child and alt-id lists of a term
const DEFAULT_NUM_EDGES: usize = 4;

/// Upper bound of every stored count
///
/// Count additions saturate at this value instead of wrapping
pub const MAX_COUNT: u32 = 0x7FFF_FFFF;

/// The update sequence of the count engine restarts at `1` after passing this value
pub const SEQUENCE_WRAP: u32 = 0x7FFF_0000;

/// Error type of all fallible operations of the term store
///
/// Lookup misses are not errors; they are returned as `None`.
#[derive(Error, Debug)]
pub enum GoError {
    /// A stanza header does not close its `[` bracket
    #[error("line {0}: malformed stanza header")]
    MalformedStanza(usize),
    /// A tag line is missing the `:` separator
    #[error("line {0}: missing `:` between tag and value")]
    MissingSeparator(usize),
    /// A quoted value does not have a closing `"`
    #[error("line {0}: unterminated quoted value")]
    UnterminatedQuote(usize),
    /// A value contains an unknown `\` escape sequence
    #[error("line {0}: unresolved escape sequence")]
    UnresolvedEscape(usize),
    /// A tag occurs more often than allowed within its stanza
    #[error("line {0}: tag occurs more often than allowed")]
    TooManyTags(usize),
    /// A stanza ends without one of its mandatory tags
    #[error("line {0}: stanza is missing a mandatory tag")]
    MissingTag(usize),
    /// Two stanzas use the same identifier
    #[error("duplicate term: {0}")]
    DuplicateTerm(String),
    /// Two stanzas define the same root term
    #[error("duplicate root term: {0}")]
    DuplicateRoot(String),
    /// The document does not define any of the recognized root terms
    #[error("no recognized root term found")]
    MissingRoot,
    /// A term has neither parents nor `part_of` edges and is not a root term
    #[error("term {0} has no parents and is not a root term")]
    DanglingTerm(String),
    /// The data does not start with the magic bytes of the binary format
    #[error("not a term store file")]
    NotThisFormat,
    /// The binary data uses a version outside of the supported range
    #[error("unsupported binary version {0}")]
    UnsupportedVersion(u32),
    /// The binary data ends before a section is complete
    #[error("binary data truncated in section {0}")]
    Truncated(&'static str),
    /// The binary data is complete but inconsistent
    #[error("corrupt binary data: {0}")]
    CorruptBinary(&'static str),
    /// The input file cannot be opened or read
    #[error("cannot open file {0}")]
    CannotOpenFile(String),
    /// The input file is not valid UTF-8
    #[error("file {0} is not valid UTF-8")]
    InvalidEncoding(String),
    /// Writing the binary file failed
    #[error("I/O failure")]
    Io(#[from] std::io::Error),
    /// An interned value does not fit into the 16 bit length field
    #[error("value of {0} bytes is too long to intern")]
    ValueTooLong(usize),
    /// Growing a table failed
    #[error("unable to grow table")]
    Allocation(#[from] TryReserveError),
    /// A number does not fit into the binary representation
    #[error("number does not fit into the binary format")]
    TryFromIntError(#[from] TryFromIntError),
}

/// Shortcut for `Result<T, GoError>`
pub type GoResult<T> = Result<T, GoError>;

/// Returns the big-endian `u32` at the start of `bytes`
///
/// # Panics
///
/// Panics if `bytes` is shorter than 4 bytes
fn u32_from_bytes(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Returns the big-endian `u16` at the start of `bytes`
///
/// # Panics
///
/// Panics if `bytes` is shorter than 2 bytes
fn u16_from_bytes(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}
