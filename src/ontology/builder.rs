//! Building the term graph
//!
//! Terms are added one by one, with all their edges as plain identifiers.
//! Once all terms are present, [`Ontology::finish_build`] sorts them,
//! validates the roots, derives the child edges and classifies every term
//! under its root.
use tracing::{debug, trace, warn};

use crate::strings::StrHandle;
use crate::term::internal::GoTermInternal;
use crate::term::{Edges, RootOntology, TermId};
use crate::{GoError, GoResult, Ontology};

/// All tags of a single term, as parsed from a document
#[derive(Debug, Default, Clone)]
pub(crate) struct TermRecord {
    pub id: String,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub definition: Option<String>,
    pub obsolete: bool,
    pub replaced_by: Option<String>,
    pub alt_ids: Vec<String>,
    pub parents: Vec<String>,
    pub part_of: Vec<String>,
}

/// Crate-only functions for setting up and building the Ontology
///
/// Those methods should not be exposed publicly
impl Ontology {
    /// Adds a new term and returns its sequential id
    ///
    /// All identifiers are interned, but not yet resolved to terms.
    /// Obsolete terms keep their alt-ids and replacement, but no edges.
    pub(crate) fn add_term(&mut self, record: TermRecord) -> GoResult<TermId> {
        self.terms.reserve(1)?;
        let own_id = self.ids.intern_str(&record.id)?;
        self.last_id = self.last_id.next();
        let mut term = GoTermInternal::new(own_id, self.last_id);

        *term.name_mut() = self.intern_value(record.name.as_deref())?;
        let namespace = record
            .namespace
            .as_deref()
            .or(self.default_namespace.as_deref())
            .map(str::to_string);
        *term.namespace_mut() = self.intern_value(namespace.as_deref())?;
        *term.definition_mut() = self.intern_value(record.definition.as_deref())?;
        *term.alt_ids_mut() = self.intern_ids(&record.alt_ids)?;

        if record.obsolete {
            term.set_obsolete();
            if let Some(replacement) = &record.replaced_by {
                *term.replaced_by_mut() = Some(self.ids.intern_str(replacement)?);
            }
        } else {
            if record.replaced_by.is_some() {
                trace!("Ignoring replacement of active term {}", record.id);
            }
            *term.parents_mut() = self.intern_ids(&record.parents)?;
            *term.part_of_mut() = self.intern_ids(&record.part_of)?;
        }

        self.terms.push(term);
        Ok(self.last_id)
    }

    fn intern_value(&mut self, value: Option<&str>) -> GoResult<Option<StrHandle>> {
        value.map(|value| self.values.intern_str(value)).transpose()
    }

    fn intern_ids(&mut self, ids: &[String]) -> GoResult<Edges> {
        let mut edges = Edges::new();
        for id in ids {
            let handle = self.ids.intern_str(id)?;
            if !edges.contains(&handle) {
                edges.push(handle);
            }
        }
        Ok(edges)
    }

    /// Completes the graph after all terms are added
    ///
    /// # Errors
    ///
    /// - [`GoError::DuplicateTerm`]: two terms share the same identifier
    /// - [`GoError::DuplicateRoot`], [`GoError::MissingRoot`],
    ///   [`GoError::DanglingTerm`]: see [`Ontology::validate_roots`]
    /// - [`GoError::Allocation`]: the counts pool cannot be allocated
    pub(crate) fn finish_build(&mut self) -> GoResult<()> {
        self.sort_terms();
        self.check_unique_ids()?;
        self.validate_roots()?;
        self.generate_child_edges();
        self.classify_roots();
        self.counts.reserve(self.terms.len())?;
        debug!("Built ontology with {} terms", self.terms.len());
        Ok(())
    }

    /// Sorts the terms by identifier
    ///
    /// Only needed before a binary search is used. Handles and sequential
    /// ids are not affected.
    pub(crate) fn sort_terms(&mut self) {
        self.terms.sort(&self.ids);
    }

    /// Ensures that every identifier is used by only one term
    ///
    /// The terms must be sorted
    pub(crate) fn check_unique_ids(&self) -> GoResult<()> {
        let mut previous: Option<StrHandle> = None;
        for term in self.terms.iter() {
            if previous == Some(term.own_id()) {
                return Err(GoError::DuplicateTerm(
                    self.ids.resolve_str(term.own_id()).to_string(),
                ));
            }
            previous = Some(term.own_id());
        }
        Ok(())
    }

    /// Finds the root terms
    ///
    /// Every active term without parents must be named like one of the
    /// roots and every root name can only be used once.
    ///
    /// # Errors
    ///
    /// - [`GoError::DuplicateRoot`]: two unlinked terms have the same root name
    /// - [`GoError::MissingRoot`]: no root term is present
    /// - [`GoError::DanglingTerm`]: an unlinked term is not a root
    pub(crate) fn validate_roots(&mut self) -> GoResult<()> {
        let mut roots: [Option<StrHandle>; 6] = [None; 6];
        let mut dangling: Option<StrHandle> = None;

        for term in self.terms.iter() {
            if term.obsolete() || term.num_parents() > 0 {
                continue;
            }
            let class = term
                .name()
                .and_then(|name| RootOntology::from_root_name(self.values.resolve_str(name)));
            match class {
                Some(class) => {
                    if roots[class.index()].is_some() {
                        return Err(GoError::DuplicateRoot(class.to_string()));
                    }
                    debug!(
                        "Root of {} is {}",
                        class,
                        self.ids.resolve_str(term.own_id())
                    );
                    roots[class.index()] = Some(term.own_id());
                }
                None => {
                    if dangling.is_none() {
                        dangling = Some(term.own_id());
                    }
                }
            }
        }

        if roots.iter().all(Option::is_none) {
            return Err(GoError::MissingRoot);
        }
        if let Some(handle) = dangling {
            return Err(GoError::DanglingTerm(
                self.ids.resolve_str(handle).to_string(),
            ));
        }
        self.roots = roots;
        Ok(())
    }

    /// Adds every active term to the child list of each of its parents
    ///
    /// Parents are resolved by binary search. Unknown and obsolete
    /// parents are skipped.
    pub(crate) fn generate_child_edges(&mut self) {
        let mut edges: Vec<(usize, StrHandle)> = Vec::new();
        for term in self.terms.iter().filter(|term| !term.no_class()) {
            for parent in term.all_parents() {
                match self.position_by_handle(parent) {
                    Some(pos) => edges.push((pos, term.own_id())),
                    None => warn!(
                        "Unknown parent {} of {}",
                        self.ids.resolve_str(parent),
                        self.ids.resolve_str(term.own_id())
                    ),
                }
            }
        }

        let mut num_edges = 0usize;
        for (pos, child) in edges {
            if let Some(parent) = self.terms.get_mut(pos) {
                if !parent.no_class() && parent.add_child(child) {
                    num_edges += 1;
                }
            }
        }
        debug!("Generated {} child edges", num_edges);
    }

    /// Assigns every term that is reachable from a root to its class
    ///
    /// The roots are walked in [`RootOntology::ROOTS`] order, a term keeps
    /// the first class it is reached from.
    pub(crate) fn classify_roots(&mut self) {
        for term in self.terms.iter_mut() {
            term.set_root(RootOntology::None);
        }
        self.class_totals = [0; 6];

        for class in RootOntology::ROOTS {
            let Some(root) = self.roots[class.index()] else {
                continue;
            };
            let mut stack = vec![root];
            while let Some(handle) = stack.pop() {
                let Some(pos) = self.position_by_handle(handle) else {
                    continue;
                };
                let Some(term) = self.terms.get_mut(pos) else {
                    continue;
                };
                if term.no_class() || term.root() != RootOntology::None {
                    continue;
                }
                term.set_root(class);
                self.class_totals[class.index()] += 1;
                stack.extend(term.children().iter().copied());
            }
            debug!(
                "Classified {} terms as {}",
                self.class_totals[class.index()],
                class
            );
        }
    }

    /// Recalculates the per-class totals from the stored classes
    pub(crate) fn recount_classes(&mut self) {
        self.class_totals = [0; 6];
        for term in self.terms.iter() {
            if term.root() != RootOntology::None {
                self.class_totals[term.root().index()] += 1;
            }
        }
    }

    pub(crate) fn set_format_version(&mut self, version: String) {
        self.format_version = Some(version);
    }

    pub(crate) fn set_data_version(&mut self, version: String) {
        self.data_version = Some(version);
    }

    pub(crate) fn set_default_namespace(&mut self, namespace: String) {
        self.default_namespace = Some(namespace);
    }
}
