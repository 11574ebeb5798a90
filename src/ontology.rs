use core::fmt::Debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::parser::binary::header::{Header, Section, SectionKind, HEADER_SIZE};
use crate::parser::binary::term::{BinaryTerm, BinaryTermBuilder, EdgeRange};
use crate::parser::binary::{BinaryVersion, Bytes};
use crate::parser::{self, ParserOptions};
use crate::stats::CountTable;
use crate::strings::{StrHandle, StringTable};
use crate::term::internal::GoTermInternal;
use crate::term::{Edges, GoTerm, RootOntology, TermId};
use crate::{GoError, GoResult};

pub(crate) mod builder;
mod counting;
mod termarena;
use termarena::Arena;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// `Ontology` is the main interface of the `goterms` crate and contains all data
///
/// The [`Ontology`] holds all terms, the two string tables that back them
/// and the counts that were attributed to the terms.
///
/// # Examples
///
/// ```
/// use goterms::{Ontology, RootOntology};
///
/// let ontology = Ontology::from_obo("tests/minimal.obo").unwrap();
///
/// assert_eq!(ontology.len(), 14);
/// assert!(ontology.locate_by_id("GO:9999999").is_none());
///
/// let root = ontology.root_term(RootOntology::Biological).unwrap();
/// assert_eq!(root.id(), "GO:0008150");
/// assert_eq!(root.name(), Some("biological_process"));
///
/// // alternative identifiers resolve to their term
/// let term = ontology.locate_by_id("GO:0000004").unwrap();
/// assert_eq!(term, root);
///
/// // Iterate all terms
/// for term in &ontology {
///     // do something with term
///     println!("{}", term.id());
/// }
/// ```
///
/// # Construction
///
/// There are two ways to build the Ontology
/// 1. Parse an OBO document with [`Ontology::from_obo`] or
///    [`Ontology::from_obo_str`]. [`ParserOptions`] control which
///    relationships count as parent edges.
/// 2. Load a binary build with [`Ontology::from_binary`] or
///    [`Ontology::from_bytes`]. Loading is much faster than parsing.
///    You can create your own binary build with [`Ontology::save`]
///    or the `obo_to_bin` demo:
///
///     `cargo run --release --example obo_to_bin <OBO FILE> <OUTPUT FILENAME>`
///
/// Both ways either return a complete ontology or an error, there is no
/// partially built state.
///
/// # Layout
///
/// Terms are connected to their parents via `is_a` and `part_of` edges. The
/// child edges are derived from those. Every term that can be reached from
/// one of the five root terms is classified under that root.
///
/// ```mermaid
/// flowchart LR
///     OBO[OBO document] -->|parse| GRAPH[Term graph]
///     GRAPH -->|classify roots| ONT[Ontology]
///     BIN[Binary file] -->|from_bytes| ONT
///     ONT -->|save| BIN
///     ONT -->|add_count| COUNTS[Term counts]
///     COUNTS -->|calculate_enrichment| STATS[Enrichment]
/// ```
///
/// ```mermaid
/// erDiagram
///     ONTOLOGY ||--|{ TERM : contains
///     ONTOLOGY ||--|| IDENTIFIERS : interns
///     ONTOLOGY ||--|| VALUES : interns
///     TERM ||--o{ TERM : is_a
///     TERM ||--o{ TERM : part_of
///     TERM ||--o| COUNTS : counted_in
///     TERM {
///         StrHandle id
///         TermId sequential_id
///         StrHandle name
///         Edges alt_ids
///         Edges parents
///         Edges children
///         RootOntology root
///     }
/// ```
#[derive(Default)]
pub struct Ontology {
    ids: StringTable,
    values: StringTable,
    terms: Arena,
    /// Identifier handles of the roots, by [`RootOntology::index`]
    roots: [Option<StrHandle>; 6],
    class_totals: [u32; 6],
    counts: CountTable,
    last_id: TermId,
    format_version: Option<String>,
    data_version: Option<String>,
    default_namespace: Option<String>,
}

impl Debug for Ontology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ontology with {} terms", self.terms.len())
    }
}

/// Public API of the Ontology
///
/// Those methods are all safe to use
impl Ontology {
    /// Parses an OBO file
    ///
    /// Only `is_a` and `part_of` relationships are parent edges, use
    /// [`Ontology::from_obo_with_options`] to change this.
    ///
    /// # Errors
    ///
    /// - The file is not present or can't be read: [`GoError::CannotOpenFile`]
    /// - The file is not UTF-8 encoded: [`GoError::InvalidEncoding`]
    /// - Any error of [`Ontology::from_obo_str`]
    ///
    /// # Examples
    ///
    /// ```
    /// use goterms::Ontology;
    ///
    /// let ontology = Ontology::from_obo("tests/minimal.obo").unwrap();
    /// assert_eq!(ontology.data_version(), Some("releases/2024-01-01"));
    /// ```
    pub fn from_obo<P: AsRef<Path>>(path: P) -> GoResult<Self> {
        Self::from_obo_with_options(path, &ParserOptions::default())
    }

    /// Parses an OBO file with custom [`ParserOptions`]
    ///
    /// # Errors
    ///
    /// See [`Ontology::from_obo`]
    pub fn from_obo_with_options<P: AsRef<Path>>(
        path: P,
        options: &ParserOptions,
    ) -> GoResult<Self> {
        let path = path.as_ref();
        let Ok(bytes) = std::fs::read(path) else {
            return Err(GoError::CannotOpenFile(path.display().to_string()));
        };
        let Ok(content) = String::from_utf8(bytes) else {
            return Err(GoError::InvalidEncoding(path.display().to_string()));
        };
        Self::from_obo_str_with_options(&content, options)
    }

    /// Parses an OBO document
    ///
    /// # Errors
    ///
    /// - Syntax errors of the document, e.g. [`GoError::MissingSeparator`]
    ///   or [`GoError::UnterminatedQuote`], with the line number
    /// - [`GoError::DuplicateTerm`]: two stanzas share an identifier
    /// - [`GoError::DuplicateRoot`]: two unlinked terms use the same root name
    /// - [`GoError::MissingRoot`]: the document has no root term
    /// - [`GoError::DanglingTerm`]: a term has no parents and is no root
    /// - [`GoError::ValueTooLong`] and [`GoError::Allocation`]
    pub fn from_obo_str(input: &str) -> GoResult<Self> {
        Self::from_obo_str_with_options(input, &ParserOptions::default())
    }

    /// Parses an OBO document with custom [`ParserOptions`]
    ///
    /// # Errors
    ///
    /// See [`Ontology::from_obo_str`]
    pub fn from_obo_str_with_options(input: &str, options: &ParserOptions) -> GoResult<Self> {
        let mut ont = Ontology::default();
        parser::go_obo::parse(input, options, &mut ont)?;
        ont.finish_build()?;
        info!("Parsed {} terms", ont.len());
        Ok(ont)
    }

    /// Loads the Ontology from a binary file
    ///
    /// # Errors
    ///
    /// - Binary file not available: [`GoError::CannotOpenFile`]
    /// - Any error of [`Ontology::from_bytes`]
    ///
    /// # Examples
    ///
    /// ```
    /// use goterms::Ontology;
    ///
    /// let mut ontology = Ontology::from_obo("tests/minimal.obo").unwrap();
    /// let path = std::env::temp_dir().join("goterms_from_binary_doc.bin");
    /// ontology.save(&path).unwrap();
    ///
    /// let loaded = Ontology::from_binary(&path).unwrap();
    /// assert_eq!(loaded.len(), ontology.len());
    /// # std::fs::remove_file(&path).unwrap();
    /// ```
    pub fn from_binary<P: AsRef<Path>>(filename: P) -> GoResult<Self> {
        let filename = filename.as_ref();
        let bytes = match File::open(filename) {
            Ok(mut file) => {
                let len = file
                    .metadata()
                    .map_err(|_| {
                        GoError::CannotOpenFile(format!(
                            "unable to get filesize of {}",
                            filename.display()
                        ))
                    })?
                    .len();
                let mut bytes = Vec::with_capacity(len.try_into()?);
                file.read_to_end(&mut bytes).map_err(|_| {
                    GoError::CannotOpenFile(format!("unable to read from {}", filename.display()))
                })?;
                bytes
            }
            Err(_) => return Err(GoError::CannotOpenFile(filename.display().to_string())),
        };
        Self::from_bytes(&bytes)
    }

    /// Builds the Ontology from a binary data blob
    ///
    /// The data must be in the format of [`Ontology::as_bytes`]. Older
    /// versions of the format are supported as well.
    ///
    /// # Errors
    ///
    /// - [`GoError::NotThisFormat`]: the data is not a term store
    /// - [`GoError::UnsupportedVersion`]: the format version is unknown
    /// - [`GoError::Truncated`]: the data ends early
    /// - [`GoError::CorruptBinary`]: the data is inconsistent
    pub fn from_bytes(bytes: &[u8]) -> GoResult<Self> {
        let header = Header::from_bytes(bytes)?;
        debug!("Parsing from bytes v{}", header.version);
        let bytes = Bytes::new(bytes, header.version);
        let mut ont = Ontology::default();

        let section = header.section(SectionKind::Identifiers);
        ont.ids = StringTable::from_bytes(&bytes[section.range()], section.count as usize)?;
        let section = header.section(SectionKind::TagValues);
        ont.values = StringTable::from_bytes(&bytes[section.range()], section.count as usize)?;

        let children = ont.edges_from_bytes(&header, bytes, SectionKind::ChildEdges)?;
        let parents = ont.edges_from_bytes(&header, bytes, SectionKind::ParentEdges)?;
        let alt_ids = ont.edges_from_bytes(&header, bytes, SectionKind::AltIdEdges)?;
        ont.add_terms_from_bytes(&header, bytes, &children, &parents, &alt_ids)?;
        ont.roots_from_header(&header)?;

        ont.sort_terms();
        ont.check_unique_ids()?;
        ont.recount_classes();
        ont.counts.reserve(ont.terms.len())?;
        info!("Loaded {} terms", ont.len());
        Ok(ont)
    }

    /// Returns the binary representation of the Ontology
    ///
    /// The binary data starts with a header, followed by the sections
    /// - identifier table
    /// - tag-value table
    /// - child edges
    /// - parent edges
    /// - alt-id edges
    /// - terms
    ///
    /// All numbers are big-endian, so the data can be exchanged between
    /// hosts of any byte order.
    ///
    /// # Errors
    ///
    /// - [`GoError::TryFromIntError`]: the data exceeds the 4 GB limit of the format
    /// - [`GoError::Allocation`]: the output buffer cannot be allocated
    ///
    /// # Examples
    ///
    /// ```
    /// use goterms::Ontology;
    ///
    /// let ontology = Ontology::from_obo("tests/minimal.obo").unwrap();
    /// let bytes = ontology.as_bytes().unwrap();
    /// assert_eq!(&bytes[0..4], b"GOTS");
    ///
    /// let copy = Ontology::from_bytes(&bytes).unwrap();
    /// assert_eq!(copy.len(), ontology.len());
    /// ```
    pub fn as_bytes(&self) -> GoResult<Vec<u8>> {
        let mut header = Header::new(BinaryVersion::CURRENT);
        for (idx, class) in RootOntology::ROOTS.iter().enumerate() {
            header.roots[idx] = self
                .root_term(*class)
                .map_or(0, |root| root.term_id().as_u32());
        }

        let mut child_edges = Vec::new();
        let mut parent_edges = Vec::new();
        let mut alt_id_edges = Vec::new();
        let mut records =
            Vec::with_capacity(self.terms.len() * BinaryTerm::record_len(BinaryVersion::CURRENT));

        for term in self.terms.iter() {
            let record = BinaryTerm {
                own_id: term.own_id().as_u32(),
                seq: term.id().as_u32(),
                name: term.name().map(|handle| handle.as_u32()),
                namespace: term.namespace().map(|handle| handle.as_u32()),
                definition: term.definition().map(|handle| handle.as_u32()),
                replaced_by: term.replaced_by().map(|handle| handle.as_u32()),
                obsolete: term.obsolete(),
                no_class: term.no_class(),
                root: term.root().as_u8(),
                alt_ids: append_edges(&mut alt_id_edges, term.alt_ids().iter().copied())?,
                parents: append_edges(&mut parent_edges, term.all_parents())?,
                is_a_count: u32::try_from(term.parents().len())?,
                children: append_edges(&mut child_edges, term.children().iter().copied())?,
            };
            record.write(&mut records);
        }

        let sections: [(SectionKind, usize, &[u8]); 6] = [
            (SectionKind::Identifiers, self.ids.len(), self.ids.as_bytes()),
            (SectionKind::TagValues, self.values.len(), self.values.as_bytes()),
            (SectionKind::ChildEdges, child_edges.len() / 4, child_edges.as_slice()),
            (SectionKind::ParentEdges, parent_edges.len() / 4, parent_edges.as_slice()),
            (SectionKind::AltIdEdges, alt_id_edges.len() / 4, alt_id_edges.as_slice()),
            (SectionKind::Terms, self.terms.len(), records.as_slice()),
        ];

        let mut offset = HEADER_SIZE;
        for (kind, count, data) in &sections {
            *header.section_mut(*kind) = Section {
                count: u32::try_from(*count)?,
                size: u32::try_from(data.len())?,
                offset: u32::try_from(offset)?,
            };
            offset += data.len();
        }
        header.file_len = u32::try_from(offset)?;

        let mut res = Vec::new();
        res.try_reserve_exact(offset)?;
        res.append(&mut header.as_bytes());
        for (_, _, data) in &sections {
            res.extend_from_slice(data);
        }
        debug!("Serialized ontology into {} bytes", res.len());
        Ok(res)
    }

    /// Saves the Ontology as binary file
    ///
    /// The terms are sorted before they are written
    ///
    /// # Errors
    ///
    /// - Any error of [`Ontology::as_bytes`]
    /// - [`GoError::Io`]: the file can't be written
    pub fn save<P: AsRef<Path>>(&mut self, filename: P) -> GoResult<()> {
        if !self.terms.is_sorted() {
            self.sort_terms();
        }
        let bytes = self.as_bytes()?;
        std::fs::write(filename.as_ref(), bytes)?;
        info!("Saved ontology to {}", filename.as_ref().display());
        Ok(())
    }

    /// Returns the number of terms in the Ontology
    ///
    /// This includes obsolete and unclassified terms
    ///
    /// # Examples
    ///
    /// ```
    /// use goterms::Ontology;
    ///
    /// let ontology = Ontology::default();
    /// assert_eq!(ontology.len(), 0);
    /// ```
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if the Ontology does not contain any terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns the number of terms classified under `class`
    ///
    /// With [`RootOntology::None`], returns the number of unclassified
    /// terms, including obsolete ones.
    pub fn num_terms(&self, class: RootOntology) -> usize {
        self.terms
            .iter()
            .filter(|term| term.root() == class)
            .count()
    }

    /// Returns the number of terms the root classification assigned to `class`
    ///
    /// Always `0` for [`RootOntology::None`]
    pub fn class_total(&self, class: RootOntology) -> u32 {
        self.class_totals[class.index()]
    }

    /// Returns the term with the identifier `id`
    ///
    /// Alternative identifiers are resolved as well.
    ///
    /// # Examples
    ///
    /// ```
    /// use goterms::Ontology;
    ///
    /// let ontology = Ontology::from_obo("tests/minimal.obo").unwrap();
    /// let term = ontology.locate_by_id("GO:0005737").unwrap();
    /// assert_eq!(term.name(), Some("cytoplasm"));
    ///
    /// assert!(ontology.locate_by_id("GO:0000000").is_none());
    /// ```
    pub fn locate_by_id(&self, id: &str) -> Option<GoTerm<'_>> {
        self.position_by_id(id)
            .and_then(|pos| self.terms.get(pos))
            .map(|term| GoTerm::new(self, term))
    }

    /// Returns the root term of the class of `term`
    pub fn locate_root(&self, term: &GoTerm) -> Option<GoTerm<'_>> {
        self.root_term(term.root_ontology())
    }

    /// Returns the root term of `class`
    pub fn root_term(&self, class: RootOntology) -> Option<GoTerm<'_>> {
        self.roots[class.index()].and_then(|handle| self.locate_handle(handle))
    }

    /// Returns the `n`th parent of `term`
    ///
    /// `is_a` parents come first, followed by `part_of` parents.
    ///
    /// # Examples
    ///
    /// ```
    /// use goterms::Ontology;
    ///
    /// let ontology = Ontology::from_obo("tests/minimal.obo").unwrap();
    /// let term = ontology.locate_by_id("GO:0044237").unwrap();
    ///
    /// assert_eq!(ontology.nth_parent(&term, 0).unwrap().id(), "GO:0008152");
    /// assert_eq!(ontology.nth_parent(&term, 1).unwrap().id(), "GO:0009987");
    /// assert!(ontology.nth_parent(&term, 2).is_none());
    /// ```
    pub fn nth_parent(&self, term: &GoTerm, n: usize) -> Option<GoTerm<'_>> {
        let pos = self.position_by_handle(term.handle())?;
        let parent = self.terms.get(pos)?.all_parents().nth(n)?;
        self.locate_handle(parent)
    }

    /// Returns the `n`th child of `term`
    pub fn nth_child(&self, term: &GoTerm, n: usize) -> Option<GoTerm<'_>> {
        let pos = self.position_by_handle(term.handle())?;
        let child = *self.terms.get(pos)?.children().get(n)?;
        self.locate_handle(child)
    }

    /// Returns an iterator of all terms, sorted by identifier
    pub fn iter(&self) -> Iter<'_> {
        self.into_iter()
    }

    /// Returns the `format-version` of the OBO document
    pub fn format_version(&self) -> Option<&str> {
        self.format_version.as_deref()
    }

    /// Returns the `data-version` of the OBO document
    pub fn data_version(&self) -> Option<&str> {
        self.data_version.as_deref()
    }

    /// Returns the `default-namespace` of the OBO document
    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Removes all terms, strings and counts
    pub fn clear(&mut self) {
        self.ids.clear();
        self.values.clear();
        self.terms.clear();
        self.roots = [None; 6];
        self.class_totals = [0; 6];
        self.counts.clear();
        self.last_id = TermId::default();
        self.format_version = None;
        self.data_version = None;
        self.default_namespace = None;
    }
}

/// Crate-only functions for term lookups
impl Ontology {
    pub(crate) fn ids(&self) -> &StringTable {
        &self.ids
    }

    pub(crate) fn values(&self) -> &StringTable {
        &self.values
    }

    pub(crate) fn counts_table(&self) -> &CountTable {
        &self.counts
    }

    /// Returns the term with the primary or alternative identifier `handle`
    pub(crate) fn locate_handle(&self, handle: StrHandle) -> Option<GoTerm<'_>> {
        self.position_by_handle(handle)
            .and_then(|pos| self.terms.get(pos))
            .map(|term| GoTerm::new(self, term))
    }

    /// Returns the arena position of the term with identifier `id`
    ///
    /// Falls back to a linear search of the alternative identifiers
    pub(crate) fn position_by_id(&self, id: &str) -> Option<usize> {
        self.terms.position(id.as_bytes(), &self.ids).or_else(|| {
            let handle = self.ids.find(id.as_bytes())?;
            self.terms.position_of_alt_id(handle)
        })
    }

    /// Returns the arena position of the term with identifier `handle`
    ///
    /// Falls back to a linear search of the alternative identifiers
    pub(crate) fn position_by_handle(&self, handle: StrHandle) -> Option<usize> {
        self.terms
            .position_of_handle(handle, &self.ids)
            .or_else(|| self.terms.position_of_alt_id(handle))
    }
}

/// Crate-only functions for binary persistence
impl Ontology {
    /// Reads an edge section and checks that all edges are identifiers
    fn edges_from_bytes(
        &self,
        header: &Header,
        bytes: Bytes,
        kind: SectionKind,
    ) -> GoResult<Vec<StrHandle>> {
        let section = header.section(kind);
        if section.size as usize != section.count as usize * 4 {
            return Err(GoError::CorruptBinary("edge section size"));
        }
        let mut edges = Vec::new();
        edges.try_reserve_exact(section.count as usize)?;
        for handle in bytes.subset(section.range()).u32_iter().map(StrHandle::from) {
            if !self.ids.contains(handle) {
                return Err(GoError::CorruptBinary("edge to unknown identifier"));
            }
            edges.push(handle);
        }
        Ok(edges)
    }

    fn add_terms_from_bytes(
        &mut self,
        header: &Header,
        bytes: Bytes,
        children: &[StrHandle],
        parents: &[StrHandle],
        alt_ids: &[StrHandle],
    ) -> GoResult<()> {
        let section = header.section(SectionKind::Terms);
        let record_len = BinaryTerm::record_len(header.version);
        if section.size as usize != section.count as usize * record_len {
            return Err(GoError::CorruptBinary("term section size"));
        }
        self.terms.reserve(section.count as usize)?;

        for record in BinaryTermBuilder::new(bytes.subset(section.range())) {
            let record = record?;
            let term = self.term_from_record(&record, children, parents, alt_ids)?;
            if term.id() > self.last_id {
                self.last_id = term.id();
            }
            self.terms.push(term);
        }
        debug!("Added {} terms from bytes", self.terms.len());
        Ok(())
    }

    fn term_from_record(
        &self,
        record: &BinaryTerm,
        children: &[StrHandle],
        parents: &[StrHandle],
        alt_ids: &[StrHandle],
    ) -> GoResult<GoTermInternal> {
        let own_id = StrHandle::from(record.own_id);
        if !self.ids.contains(own_id) {
            return Err(GoError::CorruptBinary("unknown term identifier"));
        }
        if record.seq == 0 {
            return Err(GoError::CorruptBinary("sequential id 0"));
        }
        let mut term = GoTermInternal::new(own_id, TermId::from(record.seq));

        *term.name_mut() = self.value_handle(record.name)?;
        *term.namespace_mut() = self.value_handle(record.namespace)?;
        *term.definition_mut() = self.value_handle(record.definition)?;
        if let Some(replacement) = record.replaced_by.map(StrHandle::from) {
            if !self.ids.contains(replacement) {
                return Err(GoError::CorruptBinary("unknown replacement"));
            }
            *term.replaced_by_mut() = Some(replacement);
        }

        if record.obsolete {
            term.set_obsolete();
        }
        term.set_no_class(record.no_class || record.obsolete);
        term.set_root(RootOntology::try_from(record.root)?);

        *term.alt_ids_mut() = edge_slice(alt_ids, record.alt_ids)?;
        let all_parents = edge_slice(parents, record.parents)?;
        let is_a_count = record.is_a_count as usize;
        if is_a_count > all_parents.len() {
            return Err(GoError::CorruptBinary("parent count"));
        }
        *term.parents_mut() = all_parents[..is_a_count].iter().copied().collect();
        *term.part_of_mut() = all_parents[is_a_count..].iter().copied().collect();
        *term.children_mut() = edge_slice(children, record.children)?;

        if term.no_class() && (term.num_parents() > 0 || !term.children().is_empty()) {
            return Err(GoError::CorruptBinary("unclassifiable term with edges"));
        }
        Ok(term)
    }

    fn value_handle(&self, value: Option<u32>) -> GoResult<Option<StrHandle>> {
        match value.map(StrHandle::from) {
            Some(handle) if !self.values.contains(handle) => {
                Err(GoError::CorruptBinary("unknown tag value"))
            }
            handle => Ok(handle),
        }
    }

    fn roots_from_header(&mut self, header: &Header) -> GoResult<()> {
        for (idx, class) in RootOntology::ROOTS.iter().enumerate() {
            let seq = header.roots[idx];
            if seq == 0 {
                continue;
            }
            let Some(root) = self
                .terms
                .iter()
                .find(|term| term.id().as_u32() == seq)
            else {
                return Err(GoError::CorruptBinary("unknown root term"));
            };
            self.roots[class.index()] = Some(root.own_id());
        }
        Ok(())
    }
}

/// Appends the edges to `buffer` and returns their position
fn append_edges<I>(buffer: &mut Vec<u8>, edges: I) -> GoResult<EdgeRange>
where
    I: Iterator<Item = StrHandle>,
{
    let start = u32::try_from(buffer.len() / 4)?;
    for edge in edges {
        buffer.extend_from_slice(&edge.as_u32().to_be_bytes());
    }
    let end = u32::try_from(buffer.len() / 4)?;
    Ok(EdgeRange {
        start,
        count: end - start,
    })
}

fn edge_slice(edges: &[StrHandle], range: EdgeRange) -> GoResult<Edges> {
    edges
        .get(range.range())
        .map(|slice| slice.iter().copied().collect())
        .ok_or(GoError::CorruptBinary("edge range"))
}

/// Iterates the Ontology and yields [`GoTerm`]s
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, GoTermInternal>,
    ontology: &'a Ontology,
}

impl<'a> std::iter::Iterator for Iter<'a> {
    type Item = GoTerm<'a>;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|term| GoTerm::new(self.ontology, term))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Ontology {
    type Item = GoTerm<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            inner: self.terms.iter(),
            ontology: self,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fixture() -> Ontology {
        Ontology::from_obo("tests/minimal.obo").unwrap()
    }

    /// Rewrites the term section of a current binary into version 1
    fn downgrade(bytes: &[u8]) -> Vec<u8> {
        let mut header = Header::from_bytes(bytes).unwrap();
        let terms = header.section(SectionKind::Terms);
        let records: Vec<BinaryTerm> = BinaryTermBuilder::new(Bytes::new(
            &bytes[terms.range()],
            BinaryVersion::V2,
        ))
        .collect::<GoResult<_>>()
        .unwrap();

        let mut v1 = Vec::new();
        for record in &records {
            let mut v2 = Vec::new();
            record.write(&mut v2);
            v1.extend_from_slice(&v2[0..12]);
            v1.extend_from_slice(&v2[24..28]);
            v1.extend_from_slice(&v2[28..56]);
        }

        header.version = BinaryVersion::V1;
        header.section_mut(SectionKind::Terms).size = v1.len() as u32;
        header.file_len = terms.offset + v1.len() as u32;

        let mut res = header.as_bytes();
        res.extend_from_slice(&bytes[HEADER_SIZE..terms.offset as usize]);
        res.extend_from_slice(&v1);
        res
    }

    #[test]
    fn parse_fixture() {
        let ont = fixture();
        assert_eq!(ont.len(), 14);
        assert_eq!(ont.format_version(), Some("1.2"));
        assert_eq!(ont.default_namespace(), Some("gene_ontology"));

        assert_eq!(ont.class_total(RootOntology::Cellular), 3);
        assert_eq!(ont.class_total(RootOntology::Biological), 4);
        assert_eq!(ont.class_total(RootOntology::Molecular), 2);
        assert_eq!(ont.class_total(RootOntology::PlantAnatomical), 2);
        assert_eq!(ont.class_total(RootOntology::PlantDev), 2);
        assert_eq!(ont.class_total(RootOntology::None), 0);
        assert_eq!(ont.num_terms(RootOntology::None), 1);
    }

    #[test]
    fn root_exclusivity() {
        let ont = fixture();
        let total: u32 = RootOntology::ROOTS
            .iter()
            .map(|class| ont.class_total(*class))
            .sum();
        let classified = ont
            .iter()
            .filter(|term| term.root_ontology() != RootOntology::None)
            .count();
        assert_eq!(total as usize, classified);
        for class in RootOntology::ROOTS {
            assert_eq!(ont.num_terms(class), ont.class_total(class) as usize);
        }
    }

    #[test]
    fn text_fields() {
        let ont = fixture();
        let term = ont.locate_by_id("GO:0003824").unwrap();
        assert_eq!(
            term.definition(),
            Some("Catalysis of a biochemical reaction at physiological temperatures.")
        );
        assert_eq!(term.namespace(), Some("molecular_function"));

        let fruit = ont.locate_by_id("PO:0009001").unwrap();
        assert_eq!(fruit.definition(), Some("A \"ripened\" ovary,\nwith seeds."));

        let stage = ont.locate_by_id("PO:0007033").unwrap();
        assert_eq!(stage.namespace(), Some("gene_ontology"));

        let obsolete = ont.locate_by_id("GO:0005623").unwrap();
        assert!(obsolete.is_obsolete());
        assert_eq!(obsolete.replaced_by(), Some("GO:0005575"));
    }

    #[test]
    fn sorted_case_insensitive() {
        let ont = fixture();
        let ids: Vec<&str> = ont.iter().map(|term| term.id()).collect();
        let mut sorted = ids.clone();
        sorted.sort_by_key(|id| id.to_ascii_lowercase());
        assert_eq!(ids, sorted);
    }

    #[test]
    fn navigation() {
        let ont = fixture();
        let cytoplasm = ont.locate_by_id("GO:0005737").unwrap();
        assert_eq!(cytoplasm.num_parents(), 2);
        assert_eq!(ont.nth_parent(&cytoplasm, 1).unwrap().id(), "GO:0005622");
        assert_eq!(ont.locate_root(&cytoplasm).unwrap().id(), "GO:0005575");

        let parent = ont.locate_by_id("GO:0005622").unwrap();
        assert_eq!(ont.nth_child(&parent, 0).unwrap(), cytoplasm);
        assert!(ont.nth_child(&parent, 1).is_none());
        assert!(ont.nth_child(&cytoplasm, 0).is_none());

        let root = ont.root_term(RootOntology::Cellular).unwrap();
        assert!(root.is_root());
        assert!(root.parent_of(&cytoplasm));
        assert!(cytoplasm.child_of(&root));
        assert!(!cytoplasm.is_root());

        let obsolete = ont.locate_by_id("GO:0005623").unwrap();
        assert!(ont.locate_root(&obsolete).is_none());
    }

    #[test]
    fn binary_roundtrip() {
        let ont = fixture();
        let bytes = ont.as_bytes().unwrap();
        let copy = Ontology::from_bytes(&bytes).unwrap();

        assert_eq!(copy.len(), ont.len());
        for class in RootOntology::ROOTS {
            assert_eq!(copy.class_total(class), ont.class_total(class));
            assert_eq!(
                copy.root_term(class).unwrap().id(),
                ont.root_term(class).unwrap().id()
            );
        }
        for (a, b) in ont.iter().zip(copy.iter()) {
            assert_eq!(a.id(), b.id());
            assert_eq!(a.term_id(), b.term_id());
            assert_eq!(a.name(), b.name());
            assert_eq!(a.namespace(), b.namespace());
            assert_eq!(a.definition(), b.definition());
            assert_eq!(a.replaced_by(), b.replaced_by());
            assert_eq!(a.is_obsolete(), b.is_obsolete());
            assert_eq!(a.root_ontology(), b.root_ontology());
            assert_eq!(a.parent_ids().collect::<Vec<_>>(), b.parent_ids().collect::<Vec<_>>());
            assert_eq!(a.part_of_ids().collect::<Vec<_>>(), b.part_of_ids().collect::<Vec<_>>());
            assert_eq!(a.child_ids().collect::<Vec<_>>(), b.child_ids().collect::<Vec<_>>());
            assert_eq!(a.alt_ids().collect::<Vec<_>>(), b.alt_ids().collect::<Vec<_>>());
        }

        // the copy serializes to the same bytes
        assert_eq!(copy.as_bytes().unwrap(), bytes);
    }

    #[test]
    fn loaded_ontology_counts() {
        let ont = fixture();
        let mut copy = Ontology::from_bytes(&ont.as_bytes().unwrap()).unwrap();
        let matched = copy.add_count(RootOntology::Biological, true, true, 3, ["GO:0044237"]);
        assert_eq!(matched, 1);
        assert_eq!(copy.counts("GO:0008150").unwrap().sample_count(), 3);
        assert!(copy.locate_by_id("GO:0000004").is_some());
    }

    #[test]
    fn canonical_byte_order() {
        let ont = fixture();
        let bytes = ont.as_bytes().unwrap();
        let header = Header::from_bytes(&bytes).unwrap();
        let terms = header.section(SectionKind::Terms);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 2]);
        assert_eq!(terms.count, 14);
        assert_eq!(&bytes[16..20], &(bytes.len() as u32).to_be_bytes());

        // the first record is the term sorted first
        let first = ont.iter().next().unwrap();
        let start = terms.offset as usize;
        assert_eq!(&bytes[start + 4..start + 8], &first.term_id().as_u32().to_be_bytes());
    }

    #[test]
    fn read_version_1() {
        let ont = fixture();
        let v1 = downgrade(&ont.as_bytes().unwrap());
        let copy = Ontology::from_bytes(&v1).unwrap();
        assert_eq!(copy.len(), ont.len());
        let term = copy.locate_by_id("GO:0044237").unwrap();
        assert_eq!(term.name(), Some("cellular metabolic process"));
        assert!(term.definition().is_none());
        assert!(term.namespace().is_none());
        assert_eq!(term.num_parents(), 2);
        assert_eq!(
            copy.class_total(RootOntology::Biological),
            ont.class_total(RootOntology::Biological)
        );
    }

    #[test]
    fn reject_bad_binaries() {
        let ont = fixture();
        let bytes = ont.as_bytes().unwrap();

        assert!(matches!(
            Ontology::from_bytes(b"OBO_something"),
            Err(GoError::NotThisFormat)
        ));

        let mut other = bytes.clone();
        other[11] = 7;
        assert!(matches!(
            Ontology::from_bytes(&other),
            Err(GoError::UnsupportedVersion(7))
        ));

        assert!(matches!(
            Ontology::from_bytes(&bytes[..bytes.len() - 10]),
            Err(GoError::Truncated(_))
        ));

        // identifier count far beyond the section size
        let mut corrupt = bytes.clone();
        corrupt[40..44].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            Ontology::from_bytes(&corrupt),
            Err(GoError::CorruptBinary("string table entry count"))
        ));

        // point the root of the first class to a missing term
        let mut corrupt = bytes.clone();
        corrupt[20..24].copy_from_slice(&999u32.to_be_bytes());
        assert!(matches!(
            Ontology::from_bytes(&corrupt),
            Err(GoError::CorruptBinary(_))
        ));

        // an edge that points into the middle of an identifier
        let header = Header::from_bytes(&bytes).unwrap();
        let parents = header.section(SectionKind::ParentEdges);
        let mut corrupt = bytes.clone();
        let start = parents.offset as usize;
        corrupt[start..start + 4].copy_from_slice(&1u32.to_be_bytes());
        assert!(matches!(
            Ontology::from_bytes(&corrupt),
            Err(GoError::CorruptBinary(_))
        ));
    }

    #[test]
    fn save_and_load() {
        let mut ont = fixture();
        let path = std::env::temp_dir().join("goterms_save_and_load.bin");
        ont.save(&path).unwrap();
        let copy = Ontology::from_binary(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(copy.len(), ont.len());

        assert!(matches!(
            Ontology::from_binary("does/not/exist.bin"),
            Err(GoError::CannotOpenFile(_))
        ));
    }

    #[test]
    fn missing_obo_file() {
        assert!(matches!(
            Ontology::from_obo("does/not/exist.obo"),
            Err(GoError::CannotOpenFile(_))
        ));
    }

    #[test]
    fn latin1_obo_file() {
        let path = std::env::temp_dir().join("goterms_latin1.obo");
        std::fs::write(&path, b"[Term]\nid: GO:0008150\nname: biological_process\ndef: \"caf\xe9\"\n")
            .unwrap();
        let res = Ontology::from_obo(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(res, Err(GoError::InvalidEncoding(_))));
    }

    #[test]
    fn clear() {
        let mut ont = fixture();
        ont.add_count(RootOntology::Biological, true, true, 1, ["GO:0009987"]);
        ont.clear();
        assert!(ont.is_empty());
        assert!(ont.root_term(RootOntology::Biological).is_none());
        assert!(ont.locate_by_id("GO:0009987").is_none());
        assert!(ont.data_version().is_none());
        assert_eq!(format!("{:?}", ont), "Ontology with 0 terms");
    }
}
