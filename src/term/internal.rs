use crate::stats::CountsHandle;
use crate::strings::StrHandle;
use crate::term::{Edges, RootOntology, TermId};

/// The stored representation of a term
///
/// All text fields are handles into the string tables of the owning
/// [`crate::Ontology`]: `own_id`, the edges and `replaced_by` into the
/// identifier table, everything else into the tag-value table.
#[derive(Debug, Clone)]
pub(crate) struct GoTermInternal {
    own_id: StrHandle,
    id: TermId,
    name: Option<StrHandle>,
    namespace: Option<StrHandle>,
    definition: Option<StrHandle>,
    obsolete: bool,
    replaced_by: Option<StrHandle>,
    alt_ids: Edges,
    parents: Edges,
    part_of: Edges,
    children: Edges,
    root: RootOntology,
    no_class: bool,
    counts: Option<CountsHandle>,
}

impl GoTermInternal {
    pub fn new(own_id: StrHandle, id: TermId) -> GoTermInternal {
        GoTermInternal {
            own_id,
            id,
            name: None,
            namespace: None,
            definition: None,
            obsolete: false,
            replaced_by: None,
            alt_ids: Edges::new(),
            parents: Edges::new(),
            part_of: Edges::new(),
            children: Edges::new(),
            root: RootOntology::None,
            no_class: false,
            counts: None,
        }
    }

    pub fn own_id(&self) -> StrHandle {
        self.own_id
    }

    pub fn id(&self) -> TermId {
        self.id
    }

    pub fn name(&self) -> Option<StrHandle> {
        self.name
    }

    pub fn name_mut(&mut self) -> &mut Option<StrHandle> {
        &mut self.name
    }

    pub fn namespace(&self) -> Option<StrHandle> {
        self.namespace
    }

    pub fn namespace_mut(&mut self) -> &mut Option<StrHandle> {
        &mut self.namespace
    }

    pub fn definition(&self) -> Option<StrHandle> {
        self.definition
    }

    pub fn definition_mut(&mut self) -> &mut Option<StrHandle> {
        &mut self.definition
    }

    pub fn obsolete(&self) -> bool {
        self.obsolete
    }

    /// Marks the term as obsolete
    ///
    /// Obsolete terms cannot be classified and lose all their edges
    /// except for the alt-ids.
    pub fn set_obsolete(&mut self) {
        self.obsolete = true;
        self.no_class = true;
        self.root = RootOntology::None;
        self.parents.clear();
        self.part_of.clear();
        self.children.clear();
    }

    pub fn replaced_by(&self) -> Option<StrHandle> {
        self.replaced_by
    }

    pub fn replaced_by_mut(&mut self) -> &mut Option<StrHandle> {
        &mut self.replaced_by
    }

    pub fn alt_ids(&self) -> &Edges {
        &self.alt_ids
    }

    pub fn alt_ids_mut(&mut self) -> &mut Edges {
        &mut self.alt_ids
    }

    pub fn parents(&self) -> &Edges {
        &self.parents
    }

    pub fn parents_mut(&mut self) -> &mut Edges {
        &mut self.parents
    }

    pub fn part_of(&self) -> &Edges {
        &self.part_of
    }

    pub fn part_of_mut(&mut self) -> &mut Edges {
        &mut self.part_of
    }

    /// Iterates the `is_a` parents followed by the `part_of` parents
    pub fn all_parents(&self) -> impl Iterator<Item = StrHandle> + '_ {
        self.parents.iter().chain(self.part_of.iter()).copied()
    }

    pub fn num_parents(&self) -> usize {
        self.parents.len() + self.part_of.len()
    }

    pub fn children(&self) -> &Edges {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Edges {
        &mut self.children
    }

    /// Adds a child, unless it is already present
    pub fn add_child(&mut self, child: StrHandle) -> bool {
        if self.children.contains(&child) {
            false
        } else {
            self.children.push(child);
            true
        }
    }

    pub fn root(&self) -> RootOntology {
        self.root
    }

    pub fn set_root(&mut self, root: RootOntology) {
        self.root = root;
    }

    pub fn no_class(&self) -> bool {
        self.no_class
    }

    pub fn set_no_class(&mut self, no_class: bool) {
        self.no_class = no_class;
    }

    pub fn counts(&self) -> Option<CountsHandle> {
        self.counts
    }

    pub fn counts_mut(&mut self) -> &mut Option<CountsHandle> {
        &mut self.counts
    }
}

impl PartialEq for GoTermInternal {
    fn eq(&self, other: &Self) -> bool {
        self.own_id == other.own_id
    }
}

impl Eq for GoTermInternal {}
