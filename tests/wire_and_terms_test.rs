//! Wire-form round trips and term identity across entry paths.
//!
//! The primary must resolve a literal to the same UUID whether it arrived
//! as a typed RDF object or as a SPARQL-formatted string, and wire
//! serialization must preserve awkward literals exactly.

use vitalgraph::primary::term_uuid;
use vitalgraph::rdf::{wire, TermInfo};
use vitalgraph::{Literal, NamedNode, Quad, RdfObject, RdfPredicate, TermKind};

fn graph() -> NamedNode {
    NamedNode::new("http://example.org/graph/1").unwrap()
}

#[test]
fn typed_and_wire_literals_share_a_uuid() {
    let typed = RdfObject::Literal(Literal::new_typed_literal(
        "3.5",
        NamedNode::new("http://www.w3.org/2001/XMLSchema#float").unwrap(),
    ));
    let wired = wire::parse_term("\"3.5\"^^<http://www.w3.org/2001/XMLSchema#float>").unwrap();
    assert_eq!(
        term_uuid(&TermInfo::from_object(&typed)),
        term_uuid(&TermInfo::from_object(&wired))
    );
}

#[test]
fn iri_and_literal_with_same_text_differ() {
    let iri = wire::parse_term("<urn:1>").unwrap();
    let lit = wire::parse_term("\"urn:1\"").unwrap();
    assert_ne!(
        term_uuid(&TermInfo::from_object(&iri)),
        term_uuid(&TermInfo::from_object(&lit))
    );
}

#[test]
fn embedded_quotes_and_newlines_round_trip() {
    let nasty = "she said \"hi\",\nthen\tleft \\ quickly";
    let literal = Literal::new_simple_literal(nasty);
    let wire_form = literal.to_string();
    assert!(wire_form.contains("\\\"hi\\\""));
    assert!(wire_form.contains("\\n"));
    assert!(wire_form.contains("\\t"));
    assert!(wire_form.contains("\\\\"));

    let parsed = wire::parse_term(&wire_form).unwrap();
    assert_eq!(parsed.value(), nasty);
    assert_eq!(parsed.kind(), TermKind::Literal);
}

#[test]
fn float_promotion_applies_only_on_insert() {
    let quad = Quad::new(
        NamedNode::new("http://example.org/a").unwrap().into(),
        RdfPredicate::new("http://example.org/weight").unwrap(),
        Literal::new_typed_literal(
            "32785.67923076924",
            NamedNode::new("http://www.w3.org/2001/XMLSchema#float").unwrap(),
        )
        .into(),
        graph(),
    );

    let insert = wire::insert_data_update(std::slice::from_ref(&quad), true);
    assert!(insert.contains("^^<http://www.w3.org/2001/XMLSchema#decimal>"));
    assert!(!insert.contains("XMLSchema#float"));

    let delete = wire::delete_data_update(std::slice::from_ref(&quad));
    assert!(delete.contains("^^<http://www.w3.org/2001/XMLSchema#float>"));
}

#[test]
fn quads_group_into_one_stanza_per_graph() {
    let g1 = NamedNode::new("http://g.org/1").unwrap();
    let g2 = NamedNode::new("http://g.org/2").unwrap();
    let make = |s: &str, g: &NamedNode| {
        Quad::new(
            NamedNode::new(s).unwrap().into(),
            RdfPredicate::new("http://example.org/p").unwrap(),
            Literal::new_simple_literal("v").into(),
            g.clone(),
        )
    };
    let quads = vec![
        make("http://example.org/a", &g1),
        make("http://example.org/b", &g2),
        make("http://example.org/c", &g1),
        make("http://example.org/d", &g2),
    ];
    let update = wire::insert_data_update(&quads, false);
    assert_eq!(update.matches("GRAPH <http://g.org/1>").count(), 1);
    assert_eq!(update.matches("GRAPH <http://g.org/2>").count(), 1);
    assert_eq!(update.matches(" . ").count() + update.matches(" .\n").count(), 4);
}

#[test]
fn language_tags_survive_the_wire() {
    let lit = Literal::new_language_tagged_literal("bonjour", "fr").unwrap();
    let wire_form = RdfObject::from(lit).to_string();
    assert_eq!(wire_form, "\"bonjour\"@fr");
    let back = wire::parse_term(&wire_form).unwrap();
    let RdfObject::Literal(parsed) = back else {
        panic!("expected literal");
    };
    assert_eq!(parsed.language(), Some("fr"));
    assert_eq!(parsed.value(), "bonjour");
}

#[test]
fn bare_select_result_strings_become_plain_literals() {
    // SPARQL JSON results deliver literal values without quoting; the wire
    // parser must not mistake them for IRIs.
    let term = wire::parse_term("30").unwrap();
    assert_eq!(term.kind(), TermKind::Literal);
    assert_eq!(term.value(), "30");
}
