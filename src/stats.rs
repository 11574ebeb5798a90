//! Observation counts and enrichment statistics for terms
//!
//! Callers attribute sample and background observations (usually genes) to
//! terms with [`crate::Ontology::add_count`]. The counts are propagated to
//! all ancestors of a term, so that every term knows how many observations
//! it or any of its descendants received.
//!
//! Based on those counts, [`hypergeom`] calculates the enrichment of every
//! term in the sample compared to the background.

mod counts;
pub mod hypergeom;

pub use counts::{CountsHandle, TermCounts};
pub(crate) use counts::CountTable;

/// The fold enrichment and p-value of a term
///
/// [`Enrichment`] is returned from [`hypergeom::term_enrichment`]
#[derive(Debug, Clone)]
pub struct Enrichment {
    term: String,
    pvalue: f64,
    count: u32,
    enrichment: f64,
}

impl Enrichment {
    /// Constructs an `Enrichment` for a term
    pub fn new(term: &str, pvalue: f64, count: u32, enrichment: f64) -> Self {
        Self {
            term: term.to_string(),
            pvalue,
            count,
            enrichment,
        }
    }

    /// Returns the p-value of the enrichment
    ///
    /// The p-value indicates the probability that the enrichment
    /// occured by chance
    pub fn pvalue(&self) -> f64 {
        self.pvalue
    }

    /// Returns the fold enrichment over the background population
    pub fn enrichment(&self) -> f64 {
        self.enrichment
    }

    /// Returns the identifier of the term
    pub fn id(&self) -> &str {
        &self.term
    }

    /// Returns the number of sample genes of the term
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Adds `amount` to `count`, saturating at [`crate::MAX_COUNT`]
pub(crate) fn saturating_count(count: u32, amount: u32) -> u32 {
    count.saturating_add(amount).min(crate::MAX_COUNT)
}
