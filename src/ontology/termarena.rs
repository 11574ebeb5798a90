use std::cmp::Ordering;

use crate::strings::{StrHandle, StringTable};
use crate::term::internal::GoTermInternal;
use crate::utils::cmp_ids;
use crate::{GoResult, DEFAULT_NUM_TERMS};

/// Storage of all terms
///
/// Terms are kept in a `Vec` and addressed by their position. Sorting
/// reorders the terms, so positions are only valid until the next sort;
/// everything that outlives a sort refers to terms by [`StrHandle`].
#[derive(Debug, Clone)]
pub(crate) struct Arena {
    terms: Vec<GoTermInternal>,
    sorted: bool,
}

impl Arena {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) -> GoResult<()> {
        self.terms.try_reserve(additional)?;
        Ok(())
    }

    pub fn push(&mut self, term: GoTermInternal) {
        self.sorted = false;
        self.terms.push(term);
    }

    pub fn get(&self, pos: usize) -> Option<&GoTermInternal> {
        self.terms.get(pos)
    }

    pub fn get_mut(&mut self, pos: usize) -> Option<&mut GoTermInternal> {
        self.terms.get_mut(pos)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GoTermInternal> {
        self.terms.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, GoTermInternal> {
        self.terms.iter_mut()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Sorts the terms by their identifier, ignoring case
    pub fn sort(&mut self, ids: &StringTable) {
        self.terms
            .sort_unstable_by(|a, b| cmp_ids(ids.resolve(a.own_id()), ids.resolve(b.own_id())));
        self.sorted = true;
    }

    /// Returns the position of the term with the primary identifier `id`
    ///
    /// Uses a binary search if the terms are sorted
    pub fn position(&self, id: &[u8], ids: &StringTable) -> Option<usize> {
        if self.sorted {
            self.terms
                .binary_search_by(|term| cmp_ids(ids.resolve(term.own_id()), id))
                .ok()
        } else {
            self.terms
                .iter()
                .position(|term| ids.resolve(term.own_id()) == id)
        }
    }

    /// Returns the position of the term with the primary identifier `handle`
    pub fn position_of_handle(&self, handle: StrHandle, ids: &StringTable) -> Option<usize> {
        if self.sorted {
            let id = ids.get(handle)?;
            self.terms
                .binary_search_by(|term| {
                    if term.own_id() == handle {
                        Ordering::Equal
                    } else {
                        cmp_ids(ids.resolve(term.own_id()), id)
                    }
                })
                .ok()
        } else {
            self.terms.iter().position(|term| term.own_id() == handle)
        }
    }

    /// Returns the position of the first term listing `handle` as alt-id
    pub fn position_of_alt_id(&self, handle: StrHandle) -> Option<usize> {
        self.terms
            .iter()
            .position(|term| term.alt_ids().contains(&handle))
    }

    pub fn clear(&mut self) {
        self.terms.clear();
        self.sorted = false;
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            terms: Vec::with_capacity(DEFAULT_NUM_TERMS),
            sorted: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::TermId;

    fn arena(ids: &mut StringTable, names: &[&str]) -> Arena {
        let mut arena = Arena::default();
        let mut id = TermId::default();
        for name in names {
            id = id.next();
            let handle = ids.intern_str(name).unwrap();
            arena.push(GoTermInternal::new(handle, id));
        }
        arena
    }

    #[test]
    fn sorted_lookup() {
        let mut ids = StringTable::default();
        let mut arena = arena(&mut ids, &["GO:0000003", "go:0000001", "GO:0000002"]);
        assert!(!arena.is_sorted());

        arena.sort(&ids);
        assert!(arena.is_sorted());
        let order: Vec<&str> = arena.iter().map(|t| ids.resolve_str(t.own_id())).collect();
        assert_eq!(order, vec!["go:0000001", "GO:0000002", "GO:0000003"]);

        assert_eq!(arena.position(b"GO:0000002", &ids), Some(1));
        assert_eq!(arena.position(b"go:0000001", &ids), Some(0));
        assert_eq!(arena.position(b"GO:0000009", &ids), None);

        let handle = ids.find(b"GO:0000003").unwrap();
        assert_eq!(arena.position_of_handle(handle, &ids), Some(2));
    }

    #[test]
    fn unsorted_lookup() {
        let mut ids = StringTable::default();
        let arena = arena(&mut ids, &["GO:0000003", "GO:0000001"]);
        assert_eq!(arena.position(b"GO:0000001", &ids), Some(1));
        let handle = ids.find(b"GO:0000003").unwrap();
        assert_eq!(arena.position_of_handle(handle, &ids), Some(0));
    }

    #[test]
    fn ids_survive_sort() {
        let mut ids = StringTable::default();
        let mut arena = arena(&mut ids, &["GO:0000003", "GO:0000001", "GO:0000002"]);
        arena.sort(&ids);
        let pos = arena.position(b"GO:0000003", &ids).unwrap();
        assert_eq!(arena.get(pos).unwrap().id(), TermId::from(1u32));
    }

    #[test]
    fn alt_ids() {
        let mut ids = StringTable::default();
        let mut arena = arena(&mut ids, &["GO:0000001", "GO:0000002"]);
        let alt = ids.intern_str("GO:0000099").unwrap();
        arena.get_mut(1).unwrap().alt_ids_mut().push(alt);
        assert_eq!(arena.position_of_alt_id(alt), Some(1));
    }
}
