//! Terms of the ontology and their identifiers
//!
//! [`GoTerm`] is the read-only view of a single term. It borrows from the
//! [`crate::Ontology`], so it can't outlive it and can't be kept across a
//! reload.
use smallvec::SmallVec;

use crate::strings::StrHandle;
use crate::DEFAULT_NUM_EDGES;

mod goterm;
pub(crate) mod internal;
mod iter;
mod root;
mod termid;

pub use goterm::GoTerm;
pub use iter::{Ids, Terms};
pub use root::RootOntology;
pub use termid::TermId;

/// List of identifier handles, used for all edge kinds of a term
pub(crate) type Edges = SmallVec<[StrHandle; DEFAULT_NUM_EDGES]>;
