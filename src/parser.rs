//! Parsing the ontology from OBO documents and from the binary format

use std::collections::HashSet;

pub(crate) mod binary;
/// Module to parse OBO documents
pub(crate) mod go_obo;

/// Options that change how OBO documents are parsed
///
/// # Examples
///
/// ```
/// use goterms::{Ontology, ParserOptions};
///
/// let obo = "\
/// [Term]
/// id: GO:0003674
/// name: molecular_function
///
/// [Term]
/// id: GO:0003824
/// name: catalytic activity
/// relationship: has_part GO:0003674
/// is_a: GO:0003674
///
/// [Term]
/// id: GO:0016787
/// name: hydrolase activity
/// relationship: has_part GO:0003824
/// relationship: part_of GO:0003674
/// ";
///
/// // by default, only `part_of` relationships are edges
/// let ontology = Ontology::from_obo_str(obo).unwrap();
/// let term = ontology.locate_by_id("GO:0016787").unwrap();
/// assert_eq!(term.num_parents(), 1);
///
/// let options = ParserOptions::default().with_relationship("has_part");
/// let ontology = Ontology::from_obo_str_with_options(obo, &options).unwrap();
/// let term = ontology.locate_by_id("GO:0016787").unwrap();
/// assert_eq!(term.num_parents(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ParserOptions {
    relationships: HashSet<String>,
}

impl ParserOptions {
    /// Treat `relationship: <kind> <id>` lines as parent edges
    #[must_use]
    pub fn with_relationship(mut self, kind: &str) -> Self {
        self.relationships.insert(kind.to_string());
        self
    }

    /// Do not treat `relationship: <kind> <id>` lines as parent edges
    #[must_use]
    pub fn without_relationship(mut self, kind: &str) -> Self {
        self.relationships.remove(kind);
        self
    }

    /// Returns `true` if relationships of `kind` are parent edges
    pub fn is_structural(&self, kind: &str) -> bool {
        self.relationships.contains(kind)
    }
}

impl Default for ParserOptions {
    /// Only `part_of` relationships are parent edges
    fn default() -> Self {
        Self {
            relationships: HashSet::from([String::from("part_of")]),
        }
    }
}
