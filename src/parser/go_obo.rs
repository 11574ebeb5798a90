//! Parser for OBO documents
//!
//! The document is read in three layers:
//!
//! 1. [`LogicalLines`] joins continuation lines (a line ending in an
//!    unescaped `\`) and skips blank lines and `!` comments.
//! 2. Lines starting with `[` open a new stanza. Opening a stanza
//!    finalizes the previous one and adds its term to the ontology.
//! 3. All other lines are `tag: value` pairs. The tag table of the current
//!    stanza decides how often a tag may occur and how its value is read.
//!
//! Unknown tags, and tags that are not expected in the current stanza, are
//! ignored. So are all lines of unknown stanza types.
use std::collections::HashMap;
use std::iter::Enumerate;
use std::str::Lines;

use tracing::{debug, trace};

use crate::ontology::builder::TermRecord;
use crate::parser::ParserOptions;
use crate::{GoError, GoResult, Ontology};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StanzaKind {
    /// Tags before the first stanza
    Header,
    Term,
    Typedef,
    Instance,
    Unknown,
}

impl StanzaKind {
    fn from_name(name: &str) -> Self {
        match name {
            "Term" => StanzaKind::Term,
            "Typedef" => StanzaKind::Typedef,
            "Instance" => StanzaKind::Instance,
            _ => StanzaKind::Unknown,
        }
    }

    fn rules(self) -> &'static [TagRule] {
        match self {
            StanzaKind::Header => HEADER_TAGS,
            StanzaKind::Term => TERM_TAGS,
            StanzaKind::Typedef => TYPEDEF_TAGS,
            StanzaKind::Instance => INSTANCE_TAGS,
            StanzaKind::Unknown => &[],
        }
    }
}

/// How the value of a tag is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    /// A single token
    Word,
    /// A `"`-quoted string, followed by anything
    Quoted,
    /// Free text, surrounding quotes are removed
    Text,
    /// A term identifier, followed by anything
    TermId,
}

#[derive(Debug)]
struct TagRule {
    tag: &'static str,
    mandatory: bool,
    /// `0` means unlimited
    max: usize,
    kind: ValueKind,
}

const fn rule(tag: &'static str, mandatory: bool, max: usize, kind: ValueKind) -> TagRule {
    TagRule {
        tag,
        mandatory,
        max,
        kind,
    }
}

const HEADER_TAGS: &[TagRule] = &[
    rule("format-version", false, 1, ValueKind::Word),
    rule("data-version", false, 1, ValueKind::Word),
    rule("date", false, 1, ValueKind::Text),
    rule("saved-by", false, 1, ValueKind::Text),
    rule("auto-generated-by", false, 1, ValueKind::Text),
    rule("default-namespace", false, 1, ValueKind::Word),
    rule("ontology", false, 1, ValueKind::Word),
    rule("remark", false, 0, ValueKind::Text),
    rule("subsetdef", false, 0, ValueKind::Text),
    rule("synonymtypedef", false, 0, ValueKind::Text),
    rule("import", false, 0, ValueKind::Text),
    rule("idspace", false, 0, ValueKind::Text),
];

const TERM_TAGS: &[TagRule] = &[
    rule("id", true, 1, ValueKind::TermId),
    rule("name", false, 1, ValueKind::Text),
    rule("namespace", false, 1, ValueKind::Word),
    rule("def", false, 1, ValueKind::Quoted),
    rule("comment", false, 1, ValueKind::Text),
    rule("is_obsolete", false, 1, ValueKind::Word),
    rule("is_anonymous", false, 1, ValueKind::Word),
    rule("replaced_by", false, 0, ValueKind::TermId),
    rule("consider", false, 0, ValueKind::TermId),
    rule("alt_id", false, 0, ValueKind::TermId),
    rule("is_a", false, 0, ValueKind::TermId),
    rule("relationship", false, 0, ValueKind::Text),
    rule("intersection_of", false, 0, ValueKind::Text),
    rule("union_of", false, 0, ValueKind::Text),
    rule("disjoint_from", false, 0, ValueKind::TermId),
    rule("synonym", false, 0, ValueKind::Quoted),
    rule("xref", false, 0, ValueKind::Text),
    rule("subset", false, 0, ValueKind::Word),
    rule("created_by", false, 1, ValueKind::Text),
    rule("creation_date", false, 1, ValueKind::Text),
];

const TYPEDEF_TAGS: &[TagRule] = &[
    rule("id", true, 1, ValueKind::TermId),
    rule("name", false, 1, ValueKind::Text),
    rule("namespace", false, 1, ValueKind::Word),
    rule("def", false, 1, ValueKind::Quoted),
    rule("comment", false, 1, ValueKind::Text),
    rule("is_obsolete", false, 1, ValueKind::Word),
    rule("is_a", false, 0, ValueKind::TermId),
    rule("is_transitive", false, 1, ValueKind::Word),
    rule("is_cyclic", false, 1, ValueKind::Word),
    rule("is_symmetric", false, 1, ValueKind::Word),
    rule("transitive_over", false, 0, ValueKind::TermId),
    rule("xref", false, 0, ValueKind::Text),
];

const INSTANCE_TAGS: &[TagRule] = &[
    rule("id", true, 1, ValueKind::TermId),
    rule("name", false, 1, ValueKind::Text),
    rule("instance_of", true, 1, ValueKind::TermId),
    rule("property_value", false, 0, ValueKind::Text),
    rule("comment", false, 1, ValueKind::Text),
    rule("xref", false, 0, ValueKind::Text),
];

/// Iterator of logical lines
///
/// Returns the line number of the first physical line and the joined
/// content. Blank lines and comment lines are skipped.
struct LogicalLines<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> LogicalLines<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().enumerate(),
        }
    }
}

impl Iterator for LogicalLines<'_> {
    type Item = (usize, String);
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (idx, line) = self.lines.next()?;
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('!') {
                continue;
            }
            let mut buffer = String::from(line);
            while ends_with_continuation(&buffer) {
                buffer.pop();
                if let Some((_, next)) = self.lines.next() {
                    buffer.push_str(next);
                } else {
                    // nothing to continue with, the backslash is literal
                    buffer.push('\\');
                    break;
                }
            }
            let trimmed = buffer.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('!') {
                continue;
            }
            return Some((idx + 1, buffer));
        }
    }
}

/// A line continues if it ends in an odd number of backslashes
fn ends_with_continuation(line: &str) -> bool {
    line.bytes().rev().take_while(|b| *b == b'\\').count() % 2 == 1
}

/// Returns the byte index of the first unescaped `needle`
fn find_unescaped(s: &str, needle: char) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == needle {
            return Some(idx);
        }
    }
    None
}

/// Removes a trailing `! comment`
///
/// The `!` must be unescaped and either start the value or follow whitespace
fn strip_comment(s: &str) -> &str {
    let mut escaped = false;
    let mut prev_space = true;
    for (idx, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '!' && prev_space {
            return s[..idx].trim_end();
        }
        prev_space = c.is_whitespace();
    }
    s.trim_end()
}

/// Decodes backslash escapes
///
/// A single backslash at the very end of the value is kept as is.
///
/// # Errors
///
/// [`GoError::UnresolvedEscape`] for unknown escape sequences
pub(crate) fn unescape(s: &str, line: usize) -> GoResult<String> {
    let mut res = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            res.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => res.push('\n'),
            Some('t') => res.push('\t'),
            Some('W') => res.push(' '),
            Some(
                c @ (':' | ',' | '"' | '\\' | '[' | ']' | '{' | '}' | '(' | ')' | '!' | ' '),
            ) => res.push(c),
            None => res.push('\\'),
            Some(_) => return Err(GoError::UnresolvedEscape(line)),
        }
    }
    Ok(res)
}

/// Reads a `"`-quoted string from the start of `s`
///
/// Everything after the closing quote is ignored.
///
/// # Errors
///
/// - [`GoError::UnterminatedQuote`]: the closing quote is missing
/// - [`GoError::UnresolvedEscape`]: the string contains unknown escapes
pub(crate) fn unquote(s: &str, line: usize) -> GoResult<String> {
    let Some(inner) = s.strip_prefix('"') else {
        return unescape(s, line);
    };
    match find_unescaped(inner, '"') {
        Some(end) => unescape(&inner[..end], line),
        None => Err(GoError::UnterminatedQuote(line)),
    }
}

/// Reads the first token of a value
fn first_word(s: &str) -> &str {
    strip_comment(s).split_whitespace().next().unwrap_or_default()
}

fn parse_value(value: &str, kind: ValueKind, line: usize) -> GoResult<String> {
    match kind {
        ValueKind::Word | ValueKind::TermId => unescape(first_word(value), line),
        ValueKind::Quoted => unquote(value, line),
        ValueKind::Text => {
            if value.starts_with('"') {
                unquote(value, line)
            } else {
                unescape(strip_comment(value), line)
            }
        }
    }
}

/// Splits a line into tag and (untrimmed) value
fn split_tag(line: &str, line_number: usize) -> GoResult<(&str, &str)> {
    match find_unescaped(line, ':') {
        Some(idx) if !line[..idx].trim().is_empty() => {
            Ok((line[..idx].trim(), line[idx + 1..].trim()))
        }
        _ => Err(GoError::MissingSeparator(line_number)),
    }
}

/// The stanza that is currently parsed
struct Stanza {
    kind: StanzaKind,
    line: usize,
    occurrences: HashMap<&'static str, usize>,
    record: TermRecord,
}

impl Stanza {
    fn new(kind: StanzaKind, line: usize) -> Self {
        Self {
            kind,
            line,
            occurrences: HashMap::new(),
            record: TermRecord::default(),
        }
    }

    /// Counts the tag and returns its rule
    ///
    /// Returns `None` for tags that are not expected in the stanza
    fn register(&mut self, tag: &str, line: usize) -> GoResult<Option<&'static TagRule>> {
        let Some(rule) = self.kind.rules().iter().find(|rule| rule.tag == tag) else {
            return Ok(None);
        };
        let count = self.occurrences.entry(rule.tag).or_default();
        *count += 1;
        if rule.max != 0 && *count > rule.max {
            return Err(GoError::TooManyTags(line));
        }
        Ok(Some(rule))
    }

    fn check_mandatory(&self) -> GoResult<()> {
        for rule in self.kind.rules().iter().filter(|rule| rule.mandatory) {
            if !self.occurrences.contains_key(rule.tag) {
                return Err(GoError::MissingTag(self.line));
            }
        }
        Ok(())
    }
}

/// Parses an OBO document and adds all terms to the ontology
///
/// The caller must finish the ontology afterwards (child edges, roots)
pub(crate) fn parse(input: &str, options: &ParserOptions, ontology: &mut Ontology) -> GoResult<()> {
    let mut stanza = Stanza::new(StanzaKind::Header, 0);

    for (line_number, line) in LogicalLines::new(input) {
        let line = line.trim();
        if line.starts_with('[') {
            let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) else {
                return Err(GoError::MalformedStanza(line_number));
            };
            finish_stanza(stanza, ontology)?;
            let kind = StanzaKind::from_name(name.trim());
            if kind == StanzaKind::Unknown {
                debug!("Skipping unknown stanza [{}] in line {}", name, line_number);
            }
            stanza = Stanza::new(kind, line_number);
            continue;
        }

        if stanza.kind == StanzaKind::Unknown {
            continue;
        }

        let (tag, raw_value) = split_tag(line, line_number)?;
        let Some(rule) = stanza.register(tag, line_number)? else {
            trace!("Ignoring tag {} in line {}", tag, line_number);
            continue;
        };
        let value = parse_value(raw_value, rule.kind, line_number)?;

        match stanza.kind {
            StanzaKind::Header => header_tag(tag, value, ontology),
            StanzaKind::Term => term_tag(&mut stanza.record, tag, value, options),
            _ => (),
        }
    }
    finish_stanza(stanza, ontology)
}

fn finish_stanza(stanza: Stanza, ontology: &mut Ontology) -> GoResult<()> {
    stanza.check_mandatory()?;
    match stanza.kind {
        StanzaKind::Term => {
            ontology.add_term(stanza.record)?;
        }
        StanzaKind::Typedef | StanzaKind::Instance => {
            trace!("Discarding {:?} stanza of line {}", stanza.kind, stanza.line);
        }
        StanzaKind::Header | StanzaKind::Unknown => (),
    }
    Ok(())
}

fn header_tag(tag: &str, value: String, ontology: &mut Ontology) {
    match tag {
        "format-version" => ontology.set_format_version(value),
        "data-version" => ontology.set_data_version(value),
        "default-namespace" => ontology.set_default_namespace(value),
        _ => (),
    }
}

fn term_tag(record: &mut TermRecord, tag: &str, value: String, options: &ParserOptions) {
    match tag {
        "id" => record.id = value,
        "name" => record.name = Some(value),
        "namespace" => record.namespace = Some(value),
        "def" => record.definition = Some(value),
        "is_obsolete" => record.obsolete = value == "true",
        "replaced_by" => {
            if record.replaced_by.is_none() {
                record.replaced_by = Some(value);
            }
        }
        "alt_id" => record.alt_ids.push(value),
        "is_a" => record.parents.push(value),
        "relationship" => {
            let mut parts = value.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(kind), Some(target)) if options.is_structural(kind) => {
                    record.part_of.push(target.to_string());
                }
                _ => trace!("Ignoring relationship {}", value),
            }
        }
        _ => (),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lines(input: &str) -> Vec<(usize, String)> {
        LogicalLines::new(input).collect()
    }

    #[test]
    fn skip_blank_and_comments() {
        let res = lines("a: 1\n\n! comment\n   \nb: 2\n");
        assert_eq!(res, vec![(1, "a: 1".to_string()), (5, "b: 2".to_string())]);
    }

    #[test]
    fn join_continuation() {
        let res = lines("def: \"first \\\nsecond\"\nname: x\n");
        assert_eq!(
            res,
            vec![
                (1, "def: \"first second\"".to_string()),
                (3, "name: x".to_string())
            ]
        );
    }

    #[test]
    fn comment_lines_do_not_continue() {
        let res = lines("! note \\\n[Term]\nid: GO:0008150\n");
        assert_eq!(
            res,
            vec![(2, "[Term]".to_string()), (3, "id: GO:0008150".to_string())]
        );
    }

    #[test]
    fn escaped_backslash_does_not_continue() {
        let res = lines("name: a\\\\\nnext: b\n");
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].1, "name: a\\\\");
    }

    #[test]
    fn continuation_at_end_of_input() {
        let res = lines("name: a\\");
        assert_eq!(res, vec![(1, "name: a\\".to_string())]);
    }

    #[test]
    fn unescape_sequences() {
        assert_eq!(unescape(r"a\nb\tc", 1).unwrap(), "a\nb\tc");
        assert_eq!(unescape(r#"\:\,\"\\\[\]\{\}"#, 1).unwrap(), r#":,"\[]{}"#);
        assert_eq!(unescape(r"trailing\", 1).unwrap(), "trailing\\");
        assert!(matches!(
            unescape(r"bad\q", 7),
            Err(GoError::UnresolvedEscape(7))
        ));
    }

    #[test]
    fn quoted_values() {
        assert_eq!(
            unquote(r#""A \"quoted\" text." [GOC:go]"#, 1).unwrap(),
            r#"A "quoted" text."#
        );
        assert!(matches!(
            unquote(r#""never closed"#, 3),
            Err(GoError::UnterminatedQuote(3))
        ));
        assert!(matches!(
            unquote(r#""escaped end\""#, 4),
            Err(GoError::UnterminatedQuote(4))
        ));
    }

    #[test]
    fn comments() {
        assert_eq!(strip_comment("GO:0000001 ! mitochondrion"), "GO:0000001");
        assert_eq!(strip_comment("Hello!World"), "Hello!World");
        assert_eq!(strip_comment(r"a \! b"), r"a \! b");
        assert_eq!(first_word("GO:0000001 {source=x} ! foo"), "GO:0000001");
    }

    #[test]
    fn value_kinds() {
        assert_eq!(
            parse_value("GO:0000001 ! foo", ValueKind::TermId, 1).unwrap(),
            "GO:0000001"
        );
        assert_eq!(
            parse_value("\"quoted text\"", ValueKind::Text, 1).unwrap(),
            "quoted text"
        );
        assert_eq!(
            parse_value("plain text ! comment", ValueKind::Text, 1).unwrap(),
            "plain text"
        );
        assert_eq!(
            parse_value("true", ValueKind::Word, 1).unwrap(),
            "true"
        );
    }

    #[test]
    fn tag_split() {
        assert_eq!(split_tag("id: GO:0000001", 1).unwrap(), ("id", "GO:0000001"));
        assert_eq!(split_tag("name:x", 1).unwrap(), ("name", "x"));
        assert!(matches!(
            split_tag("no separator", 9),
            Err(GoError::MissingSeparator(9))
        ));
        assert!(matches!(
            split_tag(": value", 2),
            Err(GoError::MissingSeparator(2))
        ));
        assert!(matches!(
            split_tag(r"escaped\: colon", 5),
            Err(GoError::MissingSeparator(5))
        ));
    }

    #[test]
    fn tag_occurrences() {
        let mut stanza = Stanza::new(StanzaKind::Term, 1);
        assert!(stanza.register("id", 2).unwrap().is_some());
        assert!(stanza.register("unknown", 3).unwrap().is_none());
        assert!(stanza.register("is_a", 4).unwrap().is_some());
        assert!(stanza.register("is_a", 5).unwrap().is_some());
        assert!(matches!(
            stanza.register("id", 6),
            Err(GoError::TooManyTags(6))
        ));
    }

    #[test]
    fn unexpected_tags_are_ignored() {
        let mut stanza = Stanza::new(StanzaKind::Typedef, 1);
        assert!(stanza.register("is_transitive", 2).unwrap().is_some());
        let mut stanza = Stanza::new(StanzaKind::Term, 1);
        assert!(stanza.register("is_transitive", 2).unwrap().is_none());
    }

    #[test]
    fn mandatory_tags() {
        let stanza = Stanza::new(StanzaKind::Term, 12);
        assert!(matches!(
            stanza.check_mandatory(),
            Err(GoError::MissingTag(12))
        ));
        let mut stanza = Stanza::new(StanzaKind::Term, 12);
        stanza.register("id", 13).unwrap();
        assert!(stanza.check_mandatory().is_ok());
        assert!(Stanza::new(StanzaKind::Header, 0).check_mandatory().is_ok());
    }

    #[test]
    fn relationships() {
        let options = ParserOptions::default();
        let mut record = TermRecord::default();
        term_tag(&mut record, "relationship", "part_of GO:0000001".into(), &options);
        term_tag(&mut record, "relationship", "regulates GO:0000002".into(), &options);
        term_tag(&mut record, "relationship", "part_of".into(), &options);
        assert_eq!(record.part_of, vec!["GO:0000001".to_string()]);
    }

    #[test]
    fn first_replacement_wins() {
        let options = ParserOptions::default();
        let mut record = TermRecord::default();
        term_tag(&mut record, "replaced_by", "GO:0000001".into(), &options);
        term_tag(&mut record, "replaced_by", "GO:0000002".into(), &options);
        assert_eq!(record.replaced_by.as_deref(), Some("GO:0000001"));
    }

    #[test]
    fn malformed_stanza() {
        let mut ont = Ontology::default();
        let res = parse("[Term\nid: GO:1\n", &ParserOptions::default(), &mut ont);
        assert!(matches!(res, Err(GoError::MalformedStanza(1))));
    }

    #[test]
    fn unknown_stanzas_are_skipped() {
        let mut ont = Ontology::default();
        let input = "[Foo]\nthis line has no separator\n[Term]\nid: GO:1\n";
        parse(input, &ParserOptions::default(), &mut ont).unwrap();
        assert_eq!(ont.len(), 1);
    }

    #[test]
    fn typedefs_are_not_terms() {
        let mut ont = Ontology::default();
        let input = "[Typedef]\nid: part_of\nname: part of\nis_transitive: true\n\n[Term]\nid: GO:1\n";
        parse(input, &ParserOptions::default(), &mut ont).unwrap();
        assert_eq!(ont.len(), 1);
    }

    #[test]
    fn header_metadata() {
        let mut ont = Ontology::default();
        let input = "format-version: 1.2\ndata-version: releases/2024-01-17\ndefault-namespace: gene_ontology\nremark: a\nremark: b\n";
        parse(input, &ParserOptions::default(), &mut ont).unwrap();
        assert_eq!(ont.format_version(), Some("1.2"));
        assert_eq!(ont.data_version(), Some("releases/2024-01-17"));
        assert_eq!(ont.default_namespace(), Some("gene_ontology"));
    }

    #[test]
    fn error_line_numbers() {
        let mut ont = Ontology::default();
        let input = "[Term]\nid: GO:1\n\nname \"broken\"\n";
        let res = parse(input, &ParserOptions::default(), &mut ont);
        assert!(matches!(res, Err(GoError::MissingSeparator(4))));

        let mut ont = Ontology::default();
        let input = "[Term]\nid: GO:1\ndef: \"open\n";
        let res = parse(input, &ParserOptions::default(), &mut ont);
        assert!(matches!(res, Err(GoError::UnterminatedQuote(3))));
    }
}
