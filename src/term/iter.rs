use crate::strings::{StrHandle, StringTable};
use crate::{GoTerm, Ontology};

/// An iterator over the identifiers of an edge list
pub struct Ids<'a> {
    inner: std::slice::Iter<'a, StrHandle>,
    table: &'a StringTable,
}

impl<'a> Ids<'a> {
    pub(crate) fn new(inner: &'a [StrHandle], table: &'a StringTable) -> Self {
        Self {
            inner: inner.iter(),
            table,
        }
    }
}

impl<'a> Iterator for Ids<'a> {
    type Item = &'a str;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|handle| self.table.resolve_str(*handle))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An iterator over the terms of an edge list
///
/// Edges that point to identifiers without a term are skipped
pub struct Terms<'a> {
    inner: std::slice::Iter<'a, StrHandle>,
    ontology: &'a Ontology,
}

impl<'a> Terms<'a> {
    pub(crate) fn new(inner: &'a [StrHandle], ontology: &'a Ontology) -> Self {
        Self {
            inner: inner.iter(),
            ontology,
        }
    }
}

impl<'a> Iterator for Terms<'a> {
    type Item = GoTerm<'a>;
    fn next(&mut self) -> Option<Self::Item> {
        for handle in self.inner.by_ref() {
            if let Some(term) = self.ontology.locate_handle(*handle) {
                return Some(term);
            }
        }
        None
    }
}

impl std::fmt::Debug for Terms<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Terms")
    }
}
