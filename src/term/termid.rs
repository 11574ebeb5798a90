use core::fmt::Debug;
use std::fmt::Display;

/// Sequential number of a term within an [`crate::Ontology`]
///
/// Terms are numbered `1..=n` in the order they are added. The number
/// does not change when the terms are sorted or persisted, so it can be
/// kept around as a stable reference. `0` is never assigned.
#[derive(Copy, Clone, Eq, Hash, Ord, PartialEq, PartialOrd, Default)]
pub struct TermId {
    inner: u32,
}

impl TermId {
    /// Returns the `u32` representation
    pub fn as_u32(&self) -> u32 {
        self.inner
    }

    /// Returns the next sequential id
    pub(crate) fn next(self) -> Self {
        Self {
            inner: self.inner + 1,
        }
    }
}

impl From<u32> for TermId {
    fn from(inner: u32) -> Self {
        Self { inner }
    }
}

impl Debug for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TermId({})", self)
    }
}

impl Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.inner)
    }
}
