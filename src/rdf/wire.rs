//! SPARQL wire formatting and wire-form term parsing.
//!
//! The same logical term can travel as a typed RDF object or as a
//! SPARQL-formatted string (`"42"^^<...>`, `<iri>`, `_:b0`). This module is
//! the single place where both forms are produced and consumed, so the
//! primary store always sees the unwrapped canonical value.

use super::term::{
    escape_literal, Literal, Quad, RdfError, RdfObject, RdfResult, RdfSubject, TermKind,
};
use super::vocab::{XSD_DECIMAL, XSD_FLOAT};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Extracted term metadata, as stored in a primary `term` row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TermInfo {
    /// Unwrapped lexical value
    pub text: String,
    /// Kind marker
    pub kind: TermKind,
    /// Language tag (literals only)
    pub lang: Option<String>,
    /// Datatype IRI (typed literals only)
    pub datatype: Option<String>,
}

impl TermInfo {
    /// Extract metadata from a typed RDF object.
    pub fn from_object(object: &RdfObject) -> Self {
        match object {
            RdfObject::NamedNode(n) => Self {
                text: n.as_str().to_string(),
                kind: TermKind::Iri,
                lang: None,
                datatype: None,
            },
            RdfObject::BlankNode(b) => Self {
                text: b.as_str().to_string(),
                kind: TermKind::Blank,
                lang: None,
                datatype: None,
            },
            RdfObject::Literal(l) => Self {
                text: l.value().to_string(),
                kind: TermKind::Literal,
                lang: l.language().map(str::to_string),
                datatype: l.datatype().map(|d| d.as_str().to_string()),
            },
        }
    }
}

/// Parse a wire-form term string into a typed RDF object.
///
/// Accepts the N-Triples/SPARQL serializations (`<iri>`, `"lit"`,
/// `"lit"@lang`, `"lit"^^<dt>`, `_:id`). A bare string with none of the
/// wire markers is treated as a plain literal, matching how SPARQL JSON
/// results deliver unquoted literal values.
pub fn parse_term(wire: &str) -> RdfResult<RdfObject> {
    let trimmed = wire.trim();
    let has_marker = trimmed.starts_with('<')
        || trimmed.starts_with('"')
        || trimmed.starts_with("_:");
    if !has_marker {
        return Ok(RdfObject::Literal(Literal::new_simple_literal(trimmed)));
    }
    oxrdf::Term::from_str(trimmed)
        .map(RdfObject::from)
        .map_err(|e| RdfError::InvalidLiteral(format!("{trimmed}: {e}")))
}

/// Parse a wire-form subject (`<iri>` or `_:id`).
pub fn parse_subject(wire: &str) -> RdfResult<RdfSubject> {
    match parse_term(wire)? {
        RdfObject::NamedNode(n) => Ok(RdfSubject::NamedNode(n)),
        RdfObject::BlankNode(b) => Ok(RdfSubject::BlankNode(b)),
        RdfObject::Literal(_) => Err(RdfError::InvalidIri(format!(
            "literal cannot be a subject: {wire}"
        ))),
    }
}

/// Format an object for the wire, optionally promoting `xsd:float` literals
/// to `xsd:decimal` so the index does not round the decimal expansion.
pub fn format_object(object: &RdfObject, float_to_decimal: bool) -> String {
    match object {
        RdfObject::Literal(l) if float_to_decimal => {
            match l.datatype() {
                Some(dt) if dt.as_str() == XSD_FLOAT => {
                    format!("\"{}\"^^<{}>", escape_literal(l.value()), XSD_DECIMAL)
                }
                _ => l.to_string(),
            }
        }
        other => other.to_string(),
    }
}

/// Render quads as the body of an `INSERT DATA`/`DELETE DATA` block,
/// grouped into one `GRAPH <g> { ... }` stanza per distinct context.
pub fn graph_grouped_body(quads: &[Quad], float_to_decimal: bool) -> String {
    let mut by_graph: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for quad in quads {
        let line = format!(
            "    {} {} {} .",
            quad.subject,
            quad.predicate,
            format_object(&quad.object, float_to_decimal)
        );
        by_graph
            .entry(quad.graph.as_str().to_string())
            .or_default()
            .push(line);
    }

    let mut stanzas = Vec::with_capacity(by_graph.len());
    for (graph, lines) in by_graph {
        stanzas.push(format!("  GRAPH <{}> {{\n{}\n  }}", graph, lines.join("\n")));
    }
    stanzas.join("\n")
}

/// Build a complete `INSERT DATA` update for the given quads.
pub fn insert_data_update(quads: &[Quad], float_to_decimal: bool) -> String {
    format!(
        "INSERT DATA {{\n{}\n}}",
        graph_grouped_body(quads, float_to_decimal)
    )
}

/// Build a complete `DELETE DATA` update for the given quads.
///
/// Deletes never promote floats: the wire form must match whatever the
/// index currently stores, and the promotion already happened at insert.
pub fn delete_data_update(quads: &[Quad]) -> String {
    format!("DELETE DATA {{\n{}\n}}", graph_grouped_body(quads, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::term::{NamedNode, RdfPredicate};

    fn quad(s: &str, p: &str, o: RdfObject, g: &str) -> Quad {
        Quad::new(
            NamedNode::new(s).unwrap().into(),
            RdfPredicate::new(p).unwrap(),
            o,
            NamedNode::new(g).unwrap(),
        )
    }

    #[test]
    fn test_parse_term_iri() {
        let term = parse_term("<http://example.org/a>").unwrap();
        assert_eq!(term.as_iri(), Some("http://example.org/a"));
    }

    #[test]
    fn test_parse_term_typed_literal() {
        let term = parse_term("\"42\"^^<http://www.w3.org/2001/XMLSchema#int>").unwrap();
        match &term {
            RdfObject::Literal(l) => {
                assert_eq!(l.value(), "42");
                assert_eq!(
                    l.datatype().unwrap().as_str(),
                    "http://www.w3.org/2001/XMLSchema#int"
                );
            }
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_term_language_literal() {
        let term = parse_term("\"bonjour\"@fr").unwrap();
        match &term {
            RdfObject::Literal(l) => {
                assert_eq!(l.value(), "bonjour");
                assert_eq!(l.language(), Some("fr"));
            }
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_term_bare_string_is_plain_literal() {
        let term = parse_term("just a value").unwrap();
        assert_eq!(term.value(), "just a value");
        assert_eq!(term.kind(), TermKind::Literal);
    }

    #[test]
    fn test_parse_term_blank_node() {
        let term = parse_term("_:b0").unwrap();
        assert_eq!(term.kind(), TermKind::Blank);
        assert_eq!(term.value(), "b0");
    }

    #[test]
    fn test_wire_and_typed_forms_agree() {
        // The same logical literal through both entry paths yields the same
        // unwrapped metadata.
        let typed = RdfObject::Literal(Literal::new_typed_literal(
            "42",
            NamedNode::new("http://www.w3.org/2001/XMLSchema#int").unwrap(),
        ));
        let wired = parse_term("\"42\"^^<http://www.w3.org/2001/XMLSchema#int>").unwrap();
        assert_eq!(TermInfo::from_object(&typed), TermInfo::from_object(&wired));
    }

    #[test]
    fn test_float_promotion() {
        let float_lit = RdfObject::Literal(Literal::new_typed_literal(
            "3.14",
            NamedNode::new(XSD_FLOAT).unwrap(),
        ));
        assert_eq!(
            format_object(&float_lit, true),
            format!("\"3.14\"^^<{}>", XSD_DECIMAL)
        );
        assert_eq!(
            format_object(&float_lit, false),
            format!("\"3.14\"^^<{}>", XSD_FLOAT)
        );

        // Non-float literals are untouched either way.
        let plain = RdfObject::Literal(Literal::new_simple_literal("v"));
        assert_eq!(format_object(&plain, true), "\"v\"");
    }

    #[test]
    fn test_graph_grouping() {
        let quads = vec![
            quad(
                "http://ex.org/a",
                "http://ex.org/p",
                NamedNode::new("http://ex.org/b").unwrap().into(),
                "http://g.org/1",
            ),
            quad(
                "http://ex.org/c",
                "http://ex.org/p",
                Literal::new_simple_literal("v").into(),
                "http://g.org/2",
            ),
            quad(
                "http://ex.org/d",
                "http://ex.org/p",
                Literal::new_simple_literal("w").into(),
                "http://g.org/1",
            ),
        ];
        let body = graph_grouped_body(&quads, false);
        assert_eq!(body.matches("GRAPH <http://g.org/1>").count(), 1);
        assert_eq!(body.matches("GRAPH <http://g.org/2>").count(), 1);
        // Both g1 triples land inside a single stanza.
        let g1_start = body.find("GRAPH <http://g.org/1>").unwrap();
        let g2_start = body.find("GRAPH <http://g.org/2>").unwrap();
        assert!(g1_start < g2_start);
    }

    #[test]
    fn test_literal_round_trip_through_wire() {
        let original = Literal::new_simple_literal("has \"quotes\"\nand newline");
        let wire = original.to_string();
        let parsed = parse_term(&wire).unwrap();
        match parsed {
            RdfObject::Literal(l) => assert_eq!(l.value(), original.value()),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn test_update_wrappers() {
        let quads = vec![quad(
            "http://ex.org/a",
            "http://ex.org/p",
            Literal::new_simple_literal("v").into(),
            "http://g.org/1",
        )];
        let insert = insert_data_update(&quads, true);
        assert!(insert.starts_with("INSERT DATA {"));
        assert!(insert.ends_with("}"));
        let delete = delete_data_update(&quads);
        assert!(delete.starts_with("DELETE DATA {"));
    }
}
