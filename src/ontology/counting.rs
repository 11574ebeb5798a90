use tracing::{debug, trace};

use crate::stats::hypergeom::{hypergeom, population};
use crate::stats::{CountsHandle, Enrichment, TermCounts};
use crate::{Ontology, RootOntology};

/// Attributing observations to terms
impl Ontology {
    /// Returns the counts of the term, creating an empty record if needed
    ///
    /// Returns `None` if the term is not present or can't be classified.
    pub fn get_or_create_counts(&mut self, id: &str) -> Option<&TermCounts> {
        let pos = self.position_by_id(id)?;
        let handle = self.counts_handle_at(pos)?;
        self.counts.get(handle)
    }

    /// Returns the counts of the term, if any were attributed
    pub fn counts(&self, id: &str) -> Option<&TermCounts> {
        self.locate_by_id(id)?.counts()
    }

    /// Adds an observation to all terms of `ids`
    ///
    /// Every term receives `amount` in its sample or background count and
    /// one more gene. Terms that are obsolete or belong to another class
    /// than `class` are skipped, as are identifiers that are not present.
    ///
    /// With `propagate`, all ancestors of the terms (via `is_a` and
    /// `part_of`) receive the same increment. Each term is counted at most
    /// once per call, no matter how many of `ids` lead to it, so a call
    /// should list all terms of a single gene.
    ///
    /// All counts saturate at [`crate::MAX_COUNT`].
    ///
    /// Returns the number of identifiers that were counted
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
    /// id: GO:0003674
    /// name: molecular_function
    ///
    /// [Term]
    /// id: GO:0009987
    /// name: cellular process
    /// is_a: GO:0008150
    /// ";
    /// let mut ontology = Ontology::from_obo_str(obo).unwrap();
    ///
    /// let matched = ontology.add_count(
    ///     RootOntology::Biological,
    ///     true,
    ///     true,
    ///     3,
    ///     &["GO:0009987", "GO:0003674", "GO:9999999"],
    /// );
    /// assert_eq!(matched, 1);
    ///
    /// assert_eq!(ontology.counts("GO:0009987").unwrap().sample_count(), 3);
    /// assert_eq!(ontology.counts("GO:0008150").unwrap().sample_count(), 3);
    /// assert!(ontology.counts("GO:0003674").is_none());
    /// ```
    pub fn add_count<I, S>(
        &mut self,
        class: RootOntology,
        propagate: bool,
        is_sample: bool,
        amount: u32,
        ids: I,
    ) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seq = self.counts.next_sequence();
        let mut matched = 0;
        for id in ids {
            let id = id.as_ref();
            let Some(pos) = self.position_by_id(id) else {
                trace!("{} is not part of the ontology", id);
                continue;
            };
            if !self.count_at(pos, class, is_sample, amount, seq) {
                trace!("{} is not counted as {}", id, class);
                continue;
            }
            matched += 1;
            if propagate {
                self.propagate_from(pos, class, is_sample, amount, seq);
            }
        }
        matched
    }

    /// Removes all counts and statistics
    ///
    /// The counts pool keeps its allocation
    pub fn reset_counts(&mut self) {
        for term in self.terms.iter_mut() {
            *term.counts_mut() = None;
        }
        debug!("Dropping {} count records", self.counts.len());
        self.counts.clear();
    }

    /// Calculates the enrichment of all counted terms of `class`
    ///
    /// The background and sample genes of the class's root are the
    /// population and the draws of a hypergeometric distribution. The
    /// p-value and fold enrichment are stored with the counts of each term
    /// that has sample genes.
    ///
    /// Returns the number of terms with statistics
    pub fn calculate_enrichment(&mut self, class: RootOntology) -> usize {
        let Some((total, draws)) = population(self, class) else {
            debug!("No counts for the root of {}", class);
            return 0;
        };

        let mut calculated = 0;
        for term in self.terms.iter().filter(|term| term.root() == class) {
            let Some(handle) = term.counts() else {
                continue;
            };
            let Some(counts) = self.counts.get_mut(handle) else {
                continue;
            };
            if let Some((pvalue, enrichment)) = hypergeom(
                total,
                counts.background_genes(),
                draws,
                counts.sample_genes(),
            ) {
                counts.set_statistics(pvalue, enrichment);
                calculated += 1;
            }
        }
        debug!("Calculated enrichment for {} terms of {}", calculated, class);
        calculated
    }

    /// Returns the stored enrichment of all terms of `class`
    ///
    /// Only terms processed by [`Ontology::calculate_enrichment`] are returned
    pub fn enrichment(&self, class: RootOntology) -> Vec<Enrichment> {
        self.iter()
            .filter(|term| term.root_ontology() == class)
            .filter_map(|term| {
                let counts = term.counts()?;
                Some(Enrichment::new(
                    term.id(),
                    counts.pvalue()?,
                    counts.sample_genes(),
                    counts.enrichment()?,
                ))
            })
            .collect()
    }

    /// Returns the counts handle of the term, allocating one if needed
    fn counts_handle_at(&mut self, pos: usize) -> Option<CountsHandle> {
        let term = self.terms.get_mut(pos)?;
        if term.no_class() {
            return None;
        }
        if let Some(handle) = term.counts() {
            return Some(handle);
        }
        let handle = self.counts.allocate(term.id(), term.root());
        *term.counts_mut() = Some(handle);
        Some(handle)
    }

    /// Counts the term, unless it was already counted with `seq`
    ///
    /// Returns `false` if the term can't be counted in `class`
    fn count_at(
        &mut self,
        pos: usize,
        class: RootOntology,
        is_sample: bool,
        amount: u32,
        seq: u32,
    ) -> bool {
        match self.terms.get(pos) {
            Some(term) if !term.no_class() && term.root() == class => (),
            _ => return false,
        }
        let Some(handle) = self.counts_handle_at(pos) else {
            return false;
        };
        if self.counts.stamp(handle, seq) {
            if let Some(counts) = self.counts.get_mut(handle) {
                counts.add(is_sample, amount);
            }
        }
        true
    }

    /// Counts all ancestors of the term at `pos`
    ///
    /// Ancestors outside of `class` are not counted and not followed.
    fn propagate_from(
        &mut self,
        pos: usize,
        class: RootOntology,
        is_sample: bool,
        amount: u32,
        seq: u32,
    ) {
        let mut stack: Vec<usize> = self.parent_positions(pos);
        while let Some(pos) = stack.pop() {
            match self.terms.get(pos) {
                Some(term) if !term.no_class() && term.root() == class => (),
                _ => continue,
            }
            let Some(handle) = self.counts_handle_at(pos) else {
                continue;
            };
            if !self.counts.stamp(handle, seq) {
                // already counted, and so are its ancestors
                continue;
            }
            if let Some(counts) = self.counts.get_mut(handle) {
                counts.add(is_sample, amount);
            }
            stack.extend(self.parent_positions(pos));
        }
    }

    fn parent_positions(&self, pos: usize) -> Vec<usize> {
        self.terms.get(pos).map_or_else(Vec::new, |term| {
            term.all_parents()
                .filter_map(|parent| self.position_by_handle(parent))
                .collect()
        })
    }
}
