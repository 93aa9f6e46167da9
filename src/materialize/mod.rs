//! Edge materialization: shortcut triples in the index.
//!
//! Hierarchy queries would otherwise traverse reified edge objects
//! (vitaltype + hasEdgeSource + hasEdgeDestination). For each complete
//! edge object this module maintains a direct `vg-direct:*` triple from
//! source to destination, in the index only. Materialization is a cache,
//! not a truth: its failures are logged and never fail the enclosing
//! operation, and the shortcut triples are filtered out of every primary
//! write.

use crate::index::IndexClient;
use crate::rdf::vocab::{
    is_materialized_predicate, is_relevant_node_type, EDGE_DEST, EDGE_SOURCE, ENTITY_FRAME_EDGE,
    FRAME_FRAME_EDGE, FRAME_SLOT_EDGE, VG_DIRECT_PREFIX, VITAL_TYPE,
};
use crate::rdf::Quad;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// The three recognized edge classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// `Edge_hasEntityKGFrame`: Entity → Frame
    EntityFrame,
    /// `Edge_hasKGFrame`: Frame → Frame
    FrameFrame,
    /// `Edge_hasKGSlot`: Frame → Slot
    FrameSlot,
}

impl EdgeKind {
    /// Map a vitaltype class IRI to an edge kind.
    pub fn from_class(class_iri: &str) -> Option<Self> {
        match class_iri {
            ENTITY_FRAME_EDGE => Some(EdgeKind::EntityFrame),
            FRAME_FRAME_EDGE => Some(EdgeKind::FrameFrame),
            FRAME_SLOT_EDGE => Some(EdgeKind::FrameSlot),
            _ => None,
        }
    }

    /// Prefixed shortcut predicate used in generated SPARQL.
    pub fn shortcut(&self) -> &'static str {
        match self {
            EdgeKind::EntityFrame => "vg-direct:hasEntityFrame",
            EdgeKind::FrameFrame => "vg-direct:hasFrame",
            EdgeKind::FrameSlot => "vg-direct:hasSlot",
        }
    }
}

/// A complete edge object detected in a quad batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeInfo {
    /// URI of the reified edge object
    pub edge_uri: String,
    /// Which edge class it is
    pub kind: EdgeKind,
    /// `hasEdgeSource` value
    pub source: String,
    /// `hasEdgeDestination` value
    pub dest: String,
    /// Graph the edge lives in
    pub graph: String,
}

/// Remove shortcut triples from a quad list before a primary write.
/// Returns the surviving quads and how many were dropped.
pub fn filter_materialized(quads: &[Quad]) -> (Vec<Quad>, usize) {
    let filtered: Vec<Quad> = quads
        .iter()
        .filter(|q| !is_materialized_predicate(q.predicate.as_str()))
        .cloned()
        .collect();
    let dropped = quads.len() - filtered.len();
    if dropped > 0 {
        debug!(dropped, "Filtered materialized triples before primary write");
    }
    (filtered, dropped)
}

/// Detect complete edge objects in a quad batch.
///
/// Quads are grouped by subject; a subject is a complete edge when its
/// property map carries a recognized vitaltype plus both endpoint
/// properties. Incomplete edges are skipped.
pub fn detect_edges(quads: &[Quad]) -> Vec<EdgeInfo> {
    let mut order: Vec<&str> = Vec::new();
    let mut props: HashMap<&str, HashMap<&str, &Quad>> = HashMap::new();
    for quad in quads {
        let subject = quad.subject.value();
        let entry = props.entry(subject).or_insert_with(|| {
            order.push(subject);
            HashMap::new()
        });
        entry.entry(quad.predicate.as_str()).or_insert(quad);
    }

    let mut edges = Vec::new();
    for subject in order {
        let map = &props[subject];
        let Some(kind) = map
            .get(VITAL_TYPE)
            .and_then(|q| q.object.as_iri())
            .and_then(EdgeKind::from_class)
        else {
            continue;
        };
        let source = map.get(EDGE_SOURCE).and_then(|q| q.object.as_iri());
        let dest = map.get(EDGE_DEST).and_then(|q| q.object.as_iri());
        match (source, dest) {
            (Some(source), Some(dest)) => {
                let graph = map[VITAL_TYPE].graph.as_str();
                edges.push(EdgeInfo {
                    edge_uri: subject.to_string(),
                    kind,
                    source: source.to_string(),
                    dest: dest.to_string(),
                    graph: graph.to_string(),
                });
            }
            _ => debug!(subject, "Incomplete edge object skipped"),
        }
    }
    edges
}

/// URIs of KG nodes being deleted outright.
///
/// vitaltype is present on every object and only removed on complete
/// deletion, so a deleted vitaltype quad whose object is a relevant KG
/// class marks its subject as a vanished endpoint.
pub fn deleted_endpoints(delete_quads: &[Quad]) -> BTreeSet<String> {
    let mut deleted = BTreeSet::new();
    for quad in delete_quads {
        if quad.predicate.as_str() == VITAL_TYPE {
            if let Some(class_iri) = quad.object.as_iri() {
                if is_relevant_node_type(class_iri) {
                    deleted.insert(quad.subject.value().to_string());
                }
            }
        }
    }
    deleted
}

/// Build the DELETE DATA / INSERT DATA update maintaining shortcut triples
/// for the given edge sets. Returns `None` when there is nothing to do.
pub fn materialization_update(
    insert_edges: &[EdgeInfo],
    delete_edges: &[EdgeInfo],
) -> Option<String> {
    if insert_edges.is_empty() && delete_edges.is_empty() {
        return None;
    }
    let triple_line = |edge: &EdgeInfo| {
        format!(
            "    GRAPH <{}> {{ <{}> {} <{}> . }}",
            edge.graph,
            edge.source,
            edge.kind.shortcut(),
            edge.dest
        )
    };

    let mut parts = vec![format!("PREFIX vg-direct: <{VG_DIRECT_PREFIX}>"), String::new()];
    if !delete_edges.is_empty() {
        parts.push("DELETE DATA {".to_string());
        parts.extend(delete_edges.iter().map(triple_line));
        parts.push("}".to_string());
        if !insert_edges.is_empty() {
            parts.push(";".to_string());
        }
    }
    if !insert_edges.is_empty() {
        parts.push("INSERT DATA {".to_string());
        parts.extend(insert_edges.iter().map(triple_line));
        parts.push("}".to_string());
    }
    Some(parts.join("\n"))
}

/// Build the DELETE WHERE removing every shortcut triple that points at a
/// vanished endpoint, across all graphs and all three predicates.
pub fn cleanup_update(deleted_nodes: &BTreeSet<String>) -> Option<String> {
    if deleted_nodes.is_empty() {
        return None;
    }
    let shortcuts = [
        "vg-direct:hasEntityFrame",
        "vg-direct:hasFrame",
        "vg-direct:hasSlot",
    ];
    let mut patterns = Vec::new();
    for node in deleted_nodes {
        for shortcut in shortcuts {
            patterns.push(format!("    GRAPH ?g {{ ?s {shortcut} <{node}> . }}"));
        }
    }

    let mut sparql = format!("PREFIX vg-direct: <{VG_DIRECT_PREFIX}>\n\nDELETE {{\n");
    sparql.push_str(&patterns.join("\n"));
    sparql.push_str("\n}\nWHERE {\n");
    let unions: Vec<String> = patterns.iter().map(|p| format!("  {{ {p} }}")).collect();
    sparql.push_str(&unions.join("\n    UNION\n"));
    sparql.push_str("\n}");
    Some(sparql)
}

/// Build the combined materialization update for one committed operation,
/// or `None` when no edges or endpoint deletions are involved.
pub fn build_update(insert_quads: &[Quad], delete_quads: &[Quad]) -> Option<String> {
    let insert_edges = detect_edges(insert_quads);
    let delete_edges = detect_edges(delete_quads);
    let deleted = deleted_endpoints(delete_quads);

    let edge_part = materialization_update(&insert_edges, &delete_edges);
    let cleanup_part = cleanup_update(&deleted);
    match (edge_part, cleanup_part) {
        (Some(a), Some(b)) => Some(format!("{a}\n;\n{b}")),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Executes materialization updates against the index.
pub struct EdgeMaterializer {
    index: Arc<IndexClient>,
}

impl EdgeMaterializer {
    pub fn new(index: Arc<IndexClient>) -> Self {
        Self { index }
    }

    /// Maintain shortcut triples after a committed operation.
    ///
    /// Never fails: any error is logged and swallowed, because the
    /// shortcut layer is an optimization the next write can repair.
    pub async fn materialize(&self, space_id: &str, insert_quads: &[Quad], delete_quads: &[Quad]) {
        let Some(sparql) = build_update(insert_quads, delete_quads) else {
            return;
        };
        debug!(space_id, "Applying edge materialization update");
        if let Err(e) = self.index.update(space_id, &sparql).await {
            warn!(space_id, error = %e, "Edge materialization failed; shortcut triples may lag");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{Literal, NamedNode, RdfPredicate};

    const G: &str = "http://example.org/graph/1";

    fn iri_quad(s: &str, p: &str, o: &str) -> Quad {
        Quad::new(
            NamedNode::new(s).unwrap().into(),
            RdfPredicate::new(p).unwrap(),
            NamedNode::new(o).unwrap().into(),
            NamedNode::new(G).unwrap(),
        )
    }

    fn edge_quads(edge: &str, class: &str, source: &str, dest: &str) -> Vec<Quad> {
        vec![
            iri_quad(edge, VITAL_TYPE, class),
            iri_quad(edge, EDGE_SOURCE, source),
            iri_quad(edge, EDGE_DEST, dest),
            Quad::new(
                NamedNode::new(edge).unwrap().into(),
                RdfPredicate::new("http://vital.ai/ontology/vital-core#hasName").unwrap(),
                Literal::new_simple_literal("edge").into(),
                NamedNode::new(G).unwrap(),
            ),
        ]
    }

    #[test]
    fn test_detect_complete_edge() {
        let quads = edge_quads(
            "http://example.org/edge/1",
            ENTITY_FRAME_EDGE,
            "http://example.org/E",
            "http://example.org/F",
        );
        let edges = detect_edges(&quads);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::EntityFrame);
        assert_eq!(edges[0].source, "http://example.org/E");
        assert_eq!(edges[0].dest, "http://example.org/F");
        assert_eq!(edges[0].graph, G);
    }

    #[test]
    fn test_incomplete_edge_skipped() {
        let quads = vec![
            iri_quad("http://example.org/edge/1", VITAL_TYPE, FRAME_SLOT_EDGE),
            iri_quad(
                "http://example.org/edge/1",
                EDGE_SOURCE,
                "http://example.org/F",
            ),
            // no destination
        ];
        assert!(detect_edges(&quads).is_empty());
    }

    #[test]
    fn test_non_edge_subjects_ignored() {
        let quads = vec![iri_quad(
            "http://example.org/node/1",
            VITAL_TYPE,
            "http://vital.ai/ontology/haley-ai-kg#KGEntity",
        )];
        assert!(detect_edges(&quads).is_empty());
    }

    #[test]
    fn test_filter_materialized() {
        let mut quads = edge_quads(
            "http://example.org/edge/1",
            FRAME_FRAME_EDGE,
            "http://example.org/F1",
            "http://example.org/F2",
        );
        quads.push(iri_quad(
            "http://example.org/F1",
            "http://vital.ai/vitalgraph/direct#hasFrame",
            "http://example.org/F2",
        ));
        let (filtered, dropped) = filter_materialized(&quads);
        assert_eq!(dropped, 1);
        assert_eq!(filtered.len(), 4);
        assert!(filtered
            .iter()
            .all(|q| !is_materialized_predicate(q.predicate.as_str())));
    }

    #[test]
    fn test_materialization_update_insert_only() {
        let quads = edge_quads(
            "http://example.org/edge/1",
            ENTITY_FRAME_EDGE,
            "http://example.org/E",
            "http://example.org/F",
        );
        let sparql = build_update(&quads, &[]).unwrap();
        assert!(sparql.contains("INSERT DATA {"));
        assert!(!sparql.contains("DELETE DATA {"));
        assert!(sparql.contains(
            "GRAPH <http://example.org/graph/1> { <http://example.org/E> vg-direct:hasEntityFrame <http://example.org/F> . }"
        ));
    }

    #[test]
    fn test_materialization_update_delete_then_insert() {
        let old = edge_quads(
            "http://example.org/edge/1",
            FRAME_SLOT_EDGE,
            "http://example.org/F",
            "http://example.org/S1",
        );
        let new = edge_quads(
            "http://example.org/edge/2",
            FRAME_SLOT_EDGE,
            "http://example.org/F",
            "http://example.org/S2",
        );
        let sparql = build_update(&new, &old).unwrap();
        let delete_pos = sparql.find("DELETE DATA {").unwrap();
        let insert_pos = sparql.find("INSERT DATA {").unwrap();
        assert!(delete_pos < insert_pos);
        assert!(sparql.contains(";"));
        assert!(sparql.contains("vg-direct:hasSlot <http://example.org/S1>"));
        assert!(sparql.contains("vg-direct:hasSlot <http://example.org/S2>"));
    }

    #[test]
    fn test_endpoint_deletion_cascade() {
        // Deleting a frame's vitaltype triggers cleanup of shortcuts
        // pointing at the frame.
        let deleted = vec![iri_quad(
            "http://example.org/F",
            VITAL_TYPE,
            "http://vital.ai/ontology/haley-ai-kg#KGFrame",
        )];
        let endpoints = deleted_endpoints(&deleted);
        assert!(endpoints.contains("http://example.org/F"));

        let sparql = build_update(&[], &deleted).unwrap();
        assert!(sparql.contains("DELETE {"));
        assert!(sparql.contains("WHERE {"));
        assert!(sparql.contains("UNION"));
        assert!(sparql.contains("?s vg-direct:hasEntityFrame <http://example.org/F>"));
        assert!(sparql.contains("?s vg-direct:hasFrame <http://example.org/F>"));
        assert!(sparql.contains("?s vg-direct:hasSlot <http://example.org/F>"));
    }

    #[test]
    fn test_irrelevant_type_deletion_is_ignored() {
        let deleted = vec![iri_quad(
            "http://example.org/X",
            VITAL_TYPE,
            "http://vital.ai/ontology/vital-core#VITAL_Node",
        )];
        assert!(deleted_endpoints(&deleted).is_empty());
        assert!(build_update(&[], &deleted).is_none());
    }

    #[test]
    fn test_no_edges_no_update() {
        let quads = vec![iri_quad(
            "http://example.org/a",
            "http://example.org/p",
            "http://example.org/b",
        )];
        assert!(build_update(&quads, &[]).is_none());
    }
}
