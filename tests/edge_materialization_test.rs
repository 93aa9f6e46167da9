//! Edge materialization integration tests: the full quad-batch to SPARQL
//! pipeline for the shortcut-triple layer.

use vitalgraph::materialize::{build_update, detect_edges, filter_materialized, EdgeKind};
use vitalgraph::rdf::vocab;
use vitalgraph::{Literal, NamedNode, Quad, RdfPredicate};

const GRAPH: &str = "http://example.org/graph/1";

fn quad(s: &str, p: &str, o: &str) -> Quad {
    Quad::new(
        NamedNode::new(s).unwrap().into(),
        RdfPredicate::new(p).unwrap(),
        NamedNode::new(o).unwrap().into(),
        NamedNode::new(GRAPH).unwrap(),
    )
}

fn literal_quad(s: &str, p: &str, o: &str) -> Quad {
    Quad::new(
        NamedNode::new(s).unwrap().into(),
        RdfPredicate::new(p).unwrap(),
        Literal::new_simple_literal(o).into(),
        NamedNode::new(GRAPH).unwrap(),
    )
}

/// A complete entity-frame edge object as four quads.
fn entity_frame_edge(edge: &str, source: &str, dest: &str) -> Vec<Quad> {
    vec![
        quad(edge, vocab::VITAL_TYPE, vocab::ENTITY_FRAME_EDGE),
        quad(edge, vocab::EDGE_SOURCE, source),
        quad(edge, vocab::EDGE_DEST, dest),
        literal_quad(edge, "http://vital.ai/ontology/vital-core#hasName", "e1"),
    ]
}

#[test]
fn inserting_an_edge_materializes_its_shortcut() {
    let quads = entity_frame_edge(
        "http://example.org/edge/1",
        "http://example.org/E",
        "http://example.org/F",
    );

    let edges = detect_edges(&quads);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].kind, EdgeKind::EntityFrame);

    let sparql = build_update(&quads, &[]).unwrap();
    assert!(sparql.contains("PREFIX vg-direct: <http://vital.ai/vitalgraph/direct#>"));
    assert!(sparql.contains("INSERT DATA {"));
    assert!(sparql.contains(
        "GRAPH <http://example.org/graph/1> { <http://example.org/E> vg-direct:hasEntityFrame <http://example.org/F> . }"
    ));
    assert!(!sparql.contains("DELETE"));
}

#[test]
fn deleting_an_edge_deletes_its_shortcut() {
    let quads = entity_frame_edge(
        "http://example.org/edge/1",
        "http://example.org/E",
        "http://example.org/F",
    );
    let sparql = build_update(&[], &quads).unwrap();
    assert!(sparql.contains("DELETE DATA {"));
    assert!(sparql.contains("vg-direct:hasEntityFrame <http://example.org/F>"));
    assert!(!sparql.contains("INSERT DATA"));
}

#[test]
fn endpoint_deletion_cascades_across_all_shortcuts() {
    // Deleting the frame node itself (its vitaltype quad) must remove every
    // shortcut pointing at it, even though no edge quad is in the batch.
    let deleted = vec![quad(
        "http://example.org/F",
        vocab::VITAL_TYPE,
        "http://vital.ai/ontology/haley-ai-kg#KGFrame",
    )];
    let sparql = build_update(&[], &deleted).unwrap();
    assert!(sparql.contains("DELETE {"));
    assert!(sparql.contains("WHERE {"));
    assert!(sparql.contains("UNION"));
    for shortcut in ["hasEntityFrame", "hasFrame", "hasSlot"] {
        assert!(
            sparql.contains(&format!("?s vg-direct:{shortcut} <http://example.org/F>")),
            "missing cascade for {shortcut}"
        );
    }
}

#[test]
fn slot_subclass_deletion_triggers_cascade() {
    let deleted = vec![quad(
        "http://example.org/S",
        vocab::VITAL_TYPE,
        "http://vital.ai/ontology/haley-ai-kg#KGTextSlot",
    )];
    assert!(build_update(&[], &deleted).is_some());
}

#[test]
fn materialized_triples_never_reach_the_primary() {
    let mut quads = entity_frame_edge(
        "http://example.org/edge/1",
        "http://example.org/E",
        "http://example.org/F",
    );
    // A shortcut triple arriving in a write batch is dropped before the
    // primary sees it.
    quads.push(quad(
        "http://example.org/E",
        vocab::DIRECT_HAS_ENTITY_FRAME,
        "http://example.org/F",
    ));
    let (filtered, dropped) = filter_materialized(&quads);
    assert_eq!(dropped, 1);
    assert_eq!(filtered.len(), 4);
}

#[test]
fn edge_replacement_emits_delete_then_insert() {
    let old_edge = entity_frame_edge(
        "http://example.org/edge/old",
        "http://example.org/E",
        "http://example.org/F1",
    );
    let new_edge = entity_frame_edge(
        "http://example.org/edge/new",
        "http://example.org/E",
        "http://example.org/F2",
    );
    let sparql = build_update(&new_edge, &old_edge).unwrap();
    let delete_pos = sparql.find("DELETE DATA {").unwrap();
    let insert_pos = sparql.find("INSERT DATA {").unwrap();
    assert!(delete_pos < insert_pos);
    assert!(sparql.contains("vg-direct:hasEntityFrame <http://example.org/F1>"));
    assert!(sparql.contains("vg-direct:hasEntityFrame <http://example.org/F2>"));
}

#[test]
fn plain_data_produces_no_materialization() {
    let quads = vec![
        literal_quad("http://example.org/a", "http://example.org/p", "v"),
        quad("http://example.org/a", "http://example.org/q", "http://example.org/b"),
    ];
    assert!(build_update(&quads, &[]).is_none());
    assert!(build_update(&[], &quads).is_none());
}
