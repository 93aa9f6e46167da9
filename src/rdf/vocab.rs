//! Vocabulary constants for the vital-core, haley-ai-kg, and vg-direct
//! namespaces, plus the XSD datatypes the wire layer cares about.

/// `vital-core:vitaltype` — the class marker present on every graph object.
pub const VITAL_TYPE: &str = "http://vital.ai/ontology/vital-core#vitaltype";
/// `vital-core:hasEdgeSource`
pub const EDGE_SOURCE: &str = "http://vital.ai/ontology/vital-core#hasEdgeSource";
/// `vital-core:hasEdgeDestination`
pub const EDGE_DEST: &str = "http://vital.ai/ontology/vital-core#hasEdgeDestination";

/// Entity → Frame edge class
pub const ENTITY_FRAME_EDGE: &str = "http://vital.ai/ontology/haley-ai-kg#Edge_hasEntityKGFrame";
/// Frame → Frame edge class
pub const FRAME_FRAME_EDGE: &str = "http://vital.ai/ontology/haley-ai-kg#Edge_hasKGFrame";
/// Frame → Slot edge class
pub const FRAME_SLOT_EDGE: &str = "http://vital.ai/ontology/haley-ai-kg#Edge_hasKGSlot";

/// Prefix declaration used in generated materialization SPARQL.
pub const VG_DIRECT_PREFIX: &str = "http://vital.ai/vitalgraph/direct#";

/// Shortcut predicate bypassing `Edge_hasEntityKGFrame`.
pub const DIRECT_HAS_ENTITY_FRAME: &str = "http://vital.ai/vitalgraph/direct#hasEntityFrame";
/// Shortcut predicate bypassing `Edge_hasKGFrame`.
pub const DIRECT_HAS_FRAME: &str = "http://vital.ai/vitalgraph/direct#hasFrame";
/// Shortcut predicate bypassing `Edge_hasKGSlot`.
pub const DIRECT_HAS_SLOT: &str = "http://vital.ai/vitalgraph/direct#hasSlot";

/// The three materialized predicates. Triples carrying one of these exist
/// only in the index and must never be written to the primary store.
pub const MATERIALIZED_PREDICATES: [&str; 3] =
    [DIRECT_HAS_ENTITY_FRAME, DIRECT_HAS_FRAME, DIRECT_HAS_SLOT];

/// Returns true when the predicate IRI is one of the `vg-direct:*` shortcuts.
pub fn is_materialized_predicate(predicate: &str) -> bool {
    MATERIALIZED_PREDICATES.contains(&predicate)
}

/// Node classes whose deletion requires materialized-edge cleanup.
///
/// Only nodes of these types can be the destination of a shortcut triple:
/// KGEntity, KGFrame, and every KGSlot subclass.
pub const RELEVANT_NODE_TYPES: [&str; 30] = [
    "http://vital.ai/ontology/haley-ai-kg#KGEntity",
    "http://vital.ai/ontology/haley-ai-kg#KGFrame",
    "http://vital.ai/ontology/haley-ai-kg#KGSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGAudioSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGBooleanSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGChoiceOptionSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGChoiceSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGCodeSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGCurrencySlot",
    "http://vital.ai/ontology/haley-ai-kg#KGDateTimeSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGDoubleSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGEntitySlot",
    "http://vital.ai/ontology/haley-ai-kg#KGFileUploadSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGGeoLocationSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGImageSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGIntegerSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGJSONSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGLongSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGLongTextSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGMultiChoiceOptionSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGMultiChoiceSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGMultiTaxonomyOptionSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGMultiTaxonomySlot",
    "http://vital.ai/ontology/haley-ai-kg#KGPropertySlot",
    "http://vital.ai/ontology/haley-ai-kg#KGRunSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGTaxonomyOptionSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGTaxonomySlot",
    "http://vital.ai/ontology/haley-ai-kg#KGTextSlot",
    "http://vital.ai/ontology/haley-ai-kg#KGURISlot",
    "http://vital.ai/ontology/haley-ai-kg#KGVideoSlot",
];

/// Returns true when the class IRI names a node type relevant to
/// materialized-edge cleanup.
pub fn is_relevant_node_type(class_iri: &str) -> bool {
    RELEVANT_NODE_TYPES.contains(&class_iri)
}

/// `xsd:float`
pub const XSD_FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
/// `xsd:decimal`
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
/// `xsd:string`
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialized_predicate_check() {
        assert!(is_materialized_predicate(DIRECT_HAS_ENTITY_FRAME));
        assert!(is_materialized_predicate(DIRECT_HAS_FRAME));
        assert!(is_materialized_predicate(DIRECT_HAS_SLOT));
        assert!(!is_materialized_predicate(VITAL_TYPE));
        assert!(!is_materialized_predicate(EDGE_SOURCE));
    }

    #[test]
    fn test_relevant_node_types() {
        assert!(is_relevant_node_type(
            "http://vital.ai/ontology/haley-ai-kg#KGEntity"
        ));
        assert!(is_relevant_node_type(
            "http://vital.ai/ontology/haley-ai-kg#KGTextSlot"
        ));
        assert!(is_relevant_node_type(
            "http://vital.ai/ontology/haley-ai-kg#KGVideoSlot"
        ));
        assert!(!is_relevant_node_type(ENTITY_FRAME_EDGE));
    }
}
