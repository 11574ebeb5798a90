use crate::stats::TermCounts;
use crate::strings::StrHandle;
use crate::term::internal::GoTermInternal;
use crate::term::{Ids, RootOntology, TermId, Terms};
use crate::Ontology;

/// The `GoTerm` represents a single term of the ontology
///
/// It gives access to the term's text fields, its edges and its counts.
///
/// # Examples
///
/// ```
/// use goterms::{Ontology, RootOntology};
///
/// let obo = "\
/// [Term]
/// id: GO:0008150
/// name: biological_process
///
/// [Term]
/// id: GO:0009987
/// name: cellular process
/// is_a: GO:0008150 ! biological_process
/// ";
/// let ontology = Ontology::from_obo_str(obo).unwrap();
/// let term = ontology.locate_by_id("GO:0009987").unwrap();
///
/// assert_eq!(term.name(), Some("cellular process"));
/// assert_eq!(term.root_ontology(), RootOntology::Biological);
/// assert_eq!(term.parent_ids().collect::<Vec<_>>(), vec!["GO:0008150"]);
/// assert_eq!(term.parents().next().unwrap().name(), Some("biological_process"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GoTerm<'a> {
    term: &'a GoTermInternal,
    ontology: &'a Ontology,
}

impl<'a> GoTerm<'a> {
    /// Constructs a new [`GoTerm`] from a `GoTermInternal`
    pub(crate) fn new(ontology: &'a Ontology, term: &'a GoTermInternal) -> GoTerm<'a> {
        GoTerm { term, ontology }
    }

    pub(crate) fn handle(&self) -> StrHandle {
        self.term.own_id()
    }

    /// Returns the identifier of the term
    ///
    /// e.g.: `GO:0008150`
    pub fn id(&self) -> &'a str {
        self.ontology.ids().resolve_str(self.term.own_id())
    }

    /// Returns the sequential number of the term
    pub fn term_id(&self) -> TermId {
        self.term.id()
    }

    /// Returns the name of the term
    pub fn name(&self) -> Option<&'a str> {
        self.term
            .name()
            .map(|handle| self.ontology.values().resolve_str(handle))
    }

    /// Returns the namespace of the term
    ///
    /// Terms without a `namespace` tag use the `default-namespace`
    /// of the document, if present.
    pub fn namespace(&self) -> Option<&'a str> {
        self.term
            .namespace()
            .map(|handle| self.ontology.values().resolve_str(handle))
    }

    /// Returns the definition of the term
    pub fn definition(&self) -> Option<&'a str> {
        self.term
            .definition()
            .map(|handle| self.ontology.values().resolve_str(handle))
    }

    /// Returns `true` if the term is obsolete
    pub fn is_obsolete(&self) -> bool {
        self.term.obsolete()
    }

    /// Returns `true` if the term can't be classified
    ///
    /// Such terms have no edges and never receive counts
    pub fn no_class(&self) -> bool {
        self.term.no_class()
    }

    /// Returns the identifier of the replacement of an obsolete term
    pub fn replaced_by(&self) -> Option<&'a str> {
        self.term
            .replaced_by()
            .map(|handle| self.ontology.ids().resolve_str(handle))
    }

    /// Returns an iterator of the alternative identifiers of the term
    pub fn alt_ids(&self) -> Ids<'a> {
        Ids::new(self.term.alt_ids(), self.ontology.ids())
    }

    /// Returns an iterator of the `is_a` parent identifiers
    pub fn parent_ids(&self) -> Ids<'a> {
        Ids::new(self.term.parents(), self.ontology.ids())
    }

    /// Returns an iterator of the `part_of` parent identifiers
    pub fn part_of_ids(&self) -> Ids<'a> {
        Ids::new(self.term.part_of(), self.ontology.ids())
    }

    /// Returns an iterator of the child identifiers
    pub fn child_ids(&self) -> Ids<'a> {
        Ids::new(self.term.children(), self.ontology.ids())
    }

    /// Returns an iterator of the direct `is_a` parents
    pub fn parents(&self) -> Terms<'a> {
        Terms::new(self.term.parents(), self.ontology)
    }

    /// Returns an iterator of the direct `part_of` parents
    pub fn part_of(&self) -> Terms<'a> {
        Terms::new(self.term.part_of(), self.ontology)
    }

    /// Returns an iterator of the direct children
    pub fn children(&self) -> Terms<'a> {
        Terms::new(self.term.children(), self.ontology)
    }

    /// Returns the number of `is_a` and `part_of` parents
    pub fn num_parents(&self) -> usize {
        self.term.num_parents()
    }

    /// Returns the number of children
    pub fn num_children(&self) -> usize {
        self.term.children().len()
    }

    /// Returns the root ontology the term is classified under
    pub fn root_ontology(&self) -> RootOntology {
        self.term.root()
    }

    /// Returns `true` if the term is one of the root terms
    pub fn is_root(&self) -> bool {
        self.ontology
            .root_term(self.term.root())
            .is_some_and(|root| root.handle() == self.handle())
    }

    /// Returns the counts of the term, if any were attributed
    pub fn counts(&self) -> Option<&'a TermCounts> {
        self.term
            .counts()
            .and_then(|handle| self.ontology.counts_table().get(handle))
    }

    /// Returns `true` if `self` is a direct or indirect parent of `other`
    ///
    /// Both `is_a` and `part_of` edges are followed.
    pub fn parent_of(&self, other: &GoTerm) -> bool {
        let mut stack: Vec<GoTerm> = other.parents().chain(other.part_of()).collect();
        let mut seen = Vec::new();
        while let Some(term) = stack.pop() {
            if term.handle() == self.handle() {
                return true;
            }
            if seen.contains(&term.handle()) {
                continue;
            }
            seen.push(term.handle());
            stack.extend(term.parents().chain(term.part_of()));
        }
        false
    }

    /// Returns `true` if `self` is a direct or indirect child of `other`
    pub fn child_of(&self, other: &GoTerm) -> bool {
        other.parent_of(self)
    }
}

impl PartialEq for GoTerm<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term
    }
}

impl Eq for GoTerm<'_> {}
