use tracing::debug;

use crate::stats::saturating_count;
use crate::{GoResult, RootOntology, TermId, SEQUENCE_WRAP};

/// Stable reference to the [`TermCounts`] of a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CountsHandle(usize);

/// Sample and background observations of a single term
///
/// The record is created the first time a count is attributed to the term.
/// The statistics fields are filled by
/// [`crate::Ontology::calculate_enrichment`].
#[derive(Debug, Clone, Default)]
pub struct TermCounts {
    term_id: TermId,
    root: RootOntology,
    sample_count: u32,
    sample_genes: u32,
    background_count: u32,
    background_genes: u32,
    update_seq: u32,
    pvalue: Option<f64>,
    enrichment: Option<f64>,
}

impl TermCounts {
    fn new(term_id: TermId, root: RootOntology) -> Self {
        Self {
            term_id,
            root,
            ..Default::default()
        }
    }

    /// Returns the sequential id of the counted term
    pub fn term_id(&self) -> TermId {
        self.term_id
    }

    /// Returns the root ontology of the counted term
    pub fn root_ontology(&self) -> RootOntology {
        self.root
    }

    /// Returns the summed sample amount
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Returns the number of sample genes
    pub fn sample_genes(&self) -> u32 {
        self.sample_genes
    }

    /// Returns the summed background amount
    pub fn background_count(&self) -> u32 {
        self.background_count
    }

    /// Returns the number of background genes
    pub fn background_genes(&self) -> u32 {
        self.background_genes
    }

    /// Returns the update sequence of the last count attribution
    pub fn update_sequence(&self) -> u32 {
        self.update_seq
    }

    /// Returns the enrichment p-value, if calculated
    pub fn pvalue(&self) -> Option<f64> {
        self.pvalue
    }

    /// Returns the fold enrichment, if calculated
    pub fn enrichment(&self) -> Option<f64> {
        self.enrichment
    }

    /// Adds `amount` to the sample or background count and one gene
    pub(crate) fn add(&mut self, is_sample: bool, amount: u32) {
        if is_sample {
            self.sample_count = saturating_count(self.sample_count, amount);
            self.sample_genes = saturating_count(self.sample_genes, 1);
        } else {
            self.background_count = saturating_count(self.background_count, amount);
            self.background_genes = saturating_count(self.background_genes, 1);
        }
    }

    pub(crate) fn set_statistics(&mut self, pvalue: f64, enrichment: f64) {
        self.pvalue = Some(pvalue);
        self.enrichment = Some(enrichment);
    }
}

/// Pool of all [`TermCounts`] records
///
/// The pool is sized to the number of terms once the ontology is built,
/// so allocating a record never reallocates.
#[derive(Debug, Default, Clone)]
pub(crate) struct CountTable {
    pool: Vec<TermCounts>,
    update_seq: u32,
}

impl CountTable {
    /// Reserves one record per term
    pub fn reserve(&mut self, num_terms: usize) -> GoResult<()> {
        let additional = num_terms.saturating_sub(self.pool.len());
        self.pool.try_reserve_exact(additional)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Allocates a new record and returns its handle
    pub fn allocate(&mut self, term_id: TermId, root: RootOntology) -> CountsHandle {
        let handle = CountsHandle(self.pool.len());
        self.pool.push(TermCounts::new(term_id, root));
        handle
    }

    pub fn get(&self, handle: CountsHandle) -> Option<&TermCounts> {
        self.pool.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: CountsHandle) -> Option<&mut TermCounts> {
        self.pool.get_mut(handle.0)
    }

    /// Returns the current update sequence
    pub fn sequence(&self) -> u32 {
        self.update_seq
    }

    /// Starts a new propagation pass and returns its sequence number
    ///
    /// After passing [`SEQUENCE_WRAP`] the sequence restarts at `1` and
    /// all stamps are invalidated.
    pub fn next_sequence(&mut self) -> u32 {
        if self.update_seq >= SEQUENCE_WRAP {
            debug!("Update sequence wraps after {}", self.update_seq);
            self.update_seq = 0;
            for counts in &mut self.pool {
                counts.update_seq = 0;
            }
        }
        self.update_seq += 1;
        self.update_seq
    }

    /// Stamps the record with `seq`
    ///
    /// Returns `false` if it was already stamped during this pass
    pub fn stamp(&mut self, handle: CountsHandle, seq: u32) -> bool {
        match self.get_mut(handle) {
            Some(counts) if counts.update_seq != seq => {
                counts.update_seq = seq;
                true
            }
            _ => false,
        }
    }

    /// Drops all records, keeping the pool's allocation
    pub fn clear(&mut self) {
        self.pool.clear();
        self.update_seq = 0;
    }

    #[cfg(test)]
    pub fn set_sequence(&mut self, seq: u32) {
        self.update_seq = seq;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::MAX_COUNT;

    #[test]
    fn add_sample_and_background() {
        let mut counts = TermCounts::new(TermId::from(3u32), RootOntology::Biological);
        counts.add(true, 5);
        counts.add(true, 2);
        counts.add(false, 11);
        assert_eq!(counts.sample_count(), 7);
        assert_eq!(counts.sample_genes(), 2);
        assert_eq!(counts.background_count(), 11);
        assert_eq!(counts.background_genes(), 1);
        assert!(counts.pvalue().is_none());
    }

    #[test]
    fn add_saturates() {
        let mut counts = TermCounts::new(TermId::from(3u32), RootOntology::Biological);
        counts.add(true, MAX_COUNT - 10);
        counts.add(true, 20);
        counts.add(true, u32::MAX);
        assert_eq!(counts.sample_count(), MAX_COUNT);
        assert_eq!(counts.sample_genes(), 3);
    }

    #[test]
    fn stamps() {
        let mut table = CountTable::default();
        table.reserve(2).unwrap();
        let a = table.allocate(TermId::from(1u32), RootOntology::Molecular);

        let seq = table.next_sequence();
        assert_eq!(seq, 1);
        assert!(table.stamp(a, seq));
        assert!(!table.stamp(a, seq));

        let seq = table.next_sequence();
        assert!(table.stamp(a, seq));
    }

    #[test]
    fn sequence_wraps() {
        let mut table = CountTable::default();
        let a = table.allocate(TermId::from(1u32), RootOntology::Molecular);
        table.set_sequence(SEQUENCE_WRAP - 1);

        let seq = table.next_sequence();
        assert_eq!(seq, SEQUENCE_WRAP);
        assert!(table.stamp(a, seq));

        let seq = table.next_sequence();
        assert_eq!(seq, 1);
        assert_eq!(table.get(a).unwrap().update_sequence(), 0);
        assert!(table.stamp(a, seq));
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut table = CountTable::default();
        table.reserve(10).unwrap();
        table.allocate(TermId::from(1u32), RootOntology::Molecular);
        table.clear();
        assert_eq!(table.len(), 0);
        assert_eq!(table.sequence(), 0);
        assert!(table.pool.capacity() >= 10);
    }
}
