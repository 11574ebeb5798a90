//! Calculate the enrichment of terms in a sample and the probability
//! of enrichment within the hypergeometric distribution.
//!
//! The background genes of a class's root term form the population. The
//! sample genes of the root are the draws. For every term, its background
//! genes are the successes and its sample genes the observed successes.
//!
//! # Examples
//!
//! ```
//! use goterms::{Ontology, RootOntology};
//! use goterms::stats::hypergeom::term_enrichment;
//!
//! let obo = "\
//! [Term]
//! id: GO:0008150
//! name: biological_process
//!
//! [Term]
//! id: GO:0009987
//! name: cellular process
//! is_a: GO:0008150
//!
//! [Term]
//! id: GO:0008152
//! name: metabolic process
//! is_a: GO:0008150
//! ";
//! let mut ontology = Ontology::from_obo_str(obo).unwrap();
//! let bp = RootOntology::Biological;
//!
//! // four background genes, two of them in the sample
//! ontology.add_count(bp, true, false, 1, &["GO:0009987"]);
//! ontology.add_count(bp, true, false, 1, &["GO:0009987"]);
//! ontology.add_count(bp, true, false, 1, &["GO:0008152"]);
//! ontology.add_count(bp, true, false, 1, &["GO:0008152"]);
//! ontology.add_count(bp, true, true, 1, &["GO:0009987"]);
//! ontology.add_count(bp, true, true, 1, &["GO:0009987"]);
//!
//! let mut enrichments = term_enrichment(&ontology, bp);
//!
//! // the results are not sorted by default
//! enrichments.sort_by(|a, b| a.pvalue().partial_cmp(&b.pvalue()).unwrap());
//!
//! assert_eq!(enrichments[0].id(), "GO:0009987");
//! assert!(enrichments[0].pvalue() < 1.0);
//! assert!(enrichments[0].enrichment() > 1.0);
//! ```

use statrs::distribution::{DiscreteCDF, Hypergeometric};
use tracing::{debug, warn};

use crate::stats::Enrichment;
use crate::{Ontology, RootOntology};

/// Calculates the hypergeometric enrichment of all terms of `class`
///
/// Terms without sample genes are skipped. If the class has no root term
/// or the root has no counts, the result is empty.
pub fn term_enrichment(ontology: &Ontology, class: RootOntology) -> Vec<Enrichment> {
    let mut res = Vec::new();
    let Some((population, draws)) = population(ontology, class) else {
        return res;
    };

    for term in ontology {
        if term.root_ontology() != class {
            continue;
        }
        let Some(counts) = term.counts() else {
            continue;
        };
        let observed = counts.sample_genes();
        if observed == 0 {
            debug!("Skipping {}", term.id());
            continue;
        }
        let successes = counts.background_genes();
        if let Some((pvalue, enrichment)) = hypergeom(population, successes, draws, observed) {
            res.push(Enrichment::new(term.id(), pvalue, observed, enrichment));
        }
    }
    res
}

/// Returns the population (background genes) and the draws (sample genes)
/// of a class, taken from its root term
pub(crate) fn population(ontology: &Ontology, class: RootOntology) -> Option<(u32, u32)> {
    let counts = ontology.root_term(class)?.counts()?;
    Some((counts.background_genes(), counts.sample_genes()))
}

/// Returns the p-value and fold enrichment
///
/// The p-value is the probability to observe `observed` or more
/// successes by chance.
pub(crate) fn hypergeom(
    population: u32,
    successes: u32,
    draws: u32,
    observed: u32,
) -> Option<(f64, f64)> {
    if population == 0 || successes == 0 || draws == 0 || observed == 0 {
        return None;
    }
    let hyper = match Hypergeometric::new(population.into(), successes.into(), draws.into()) {
        Ok(hyper) => hyper,
        Err(err) => {
            warn!(
                "Invalid counts: Population: {}, Successes: {}, Draws: {}: {}",
                population, successes, draws, err
            );
            return None;
        }
    };

    // subtracting 1, because we want to test including observed
    // e.g. "7 or more", but sf by default calculates "more than 7"
    let pvalue = hyper.sf(u64::from(observed - 1));
    let enrichment = (f64::from(observed) / f64::from(draws))
        / (f64::from(successes) / f64::from(population));

    debug!(
        "Population: {}, Successes: {}, Draws: {}, Observed: {}",
        population, successes, draws, observed
    );
    Some((pvalue, enrichment))
}
