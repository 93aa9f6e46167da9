//! UPDATE parser integration tests.
//!
//! These cover the paths that never touch the index: concrete-data
//! operations, graph management, and every rejection rule. Pattern
//! resolution (Modify with variables) needs a live index and is exercised
//! by the unit tests on its pure pieces instead.

use vitalgraph::config::FusekiConfig;
use vitalgraph::index::IndexClient;
use vitalgraph::sparql::{UpdateOperation, UpdateParseError, UpdateParser};
use vitalgraph::TermKind;
use std::sync::Arc;

fn parser() -> UpdateParser {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    // Never contacted for the operations under test.
    let index = Arc::new(IndexClient::new(&FusekiConfig::default()).unwrap());
    UpdateParser::new(index)
}

#[tokio::test]
async fn insert_data_extracts_concrete_quads() {
    let parsed = parser()
        .parse(
            "s1",
            r#"INSERT DATA {
                GRAPH <http://g.org/1> {
                    <http://ex.org/a> <http://ex.org/p> "v" .
                    <http://ex.org/a> <http://ex.org/q> "42"^^<http://www.w3.org/2001/XMLSchema#int> .
                }
                GRAPH <http://g.org/2> {
                    <http://ex.org/b> <http://ex.org/p> <http://ex.org/c> .
                }
            }"#,
        )
        .await
        .unwrap();

    let UpdateOperation::InsertData { quads } = &parsed.operation else {
        panic!("expected InsertData, got {:?}", parsed.operation.kind());
    };
    assert_eq!(quads.len(), 3);
    assert_eq!(quads[0].graph.as_str(), "http://g.org/1");
    assert_eq!(quads[2].graph.as_str(), "http://g.org/2");
    assert_eq!(quads[0].object.value(), "v");
    assert_eq!(quads[0].object.kind(), TermKind::Literal);

    let mut graphs = parsed.operation.insert_graph_uris();
    graphs.sort();
    assert_eq!(graphs, vec!["http://g.org/1", "http://g.org/2"]);
}

#[tokio::test]
async fn delete_data_extracts_concrete_quads() {
    let parsed = parser()
        .parse(
            "s1",
            r#"DELETE DATA {
                GRAPH <http://g.org/1> { <http://ex.org/a> <http://ex.org/p> "v" . }
            }"#,
        )
        .await
        .unwrap();
    let UpdateOperation::DeleteData { quads } = &parsed.operation else {
        panic!("expected DeleteData");
    };
    assert_eq!(quads.len(), 1);
    assert_eq!(quads[0].subject.value(), "http://ex.org/a");
    assert!(parsed.operation.insert_graph_uris().is_empty());
}

#[tokio::test]
async fn graph_management_operations() {
    let p = parser();

    let drop = p.parse("s1", "DROP GRAPH <http://g.org/1>").await.unwrap();
    assert!(matches!(drop.operation, UpdateOperation::DropGraph { ref graph } if graph.as_str() == "http://g.org/1"));

    let clear = p.parse("s1", "CLEAR GRAPH <http://g.org/1>").await.unwrap();
    assert!(matches!(clear.operation, UpdateOperation::ClearGraph { .. }));

    let create = p
        .parse("s1", "CREATE GRAPH <http://g.org/new>")
        .await
        .unwrap();
    assert!(matches!(create.operation, UpdateOperation::CreateGraph { ref graph } if graph.as_str() == "http://g.org/new"));
}

#[tokio::test]
async fn delete_where_shorthand_is_rejected() {
    let result = parser()
        .parse("s1", "DELETE WHERE { GRAPH <http://g.org/1> { ?s ?p ?o } }")
        .await;
    assert!(matches!(result, Err(UpdateParseError::DeleteWhere)));
}

#[tokio::test]
async fn multiple_operations_are_rejected() {
    let result = parser()
        .parse(
            "s1",
            "INSERT DATA { GRAPH <urn:g> { <urn:a> <urn:p> \"1\" } } ; \
             INSERT DATA { GRAPH <urn:g> { <urn:b> <urn:p> \"2\" } }",
        )
        .await;
    assert!(matches!(result, Err(UpdateParseError::OperationCount(2))));
}

#[tokio::test]
async fn malformed_sparql_is_rejected() {
    let result = parser().parse("s1", "INSERT DATA { GRAPH <urn:g> {").await;
    assert!(matches!(result, Err(UpdateParseError::Syntax(_))));

    // Unquoted literal, the classic malformed input.
    let result = parser()
        .parse("s1", "INSERT DATA { GRAPH <urn:g> { <urn:a> <urn:p> v } }")
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn default_graph_quads_are_rejected() {
    let result = parser()
        .parse("s1", "INSERT DATA { <urn:a> <urn:p> \"v\" }")
        .await;
    assert!(matches!(result, Err(UpdateParseError::DefaultGraph)));
}

#[tokio::test]
async fn non_ground_insert_template_is_rejected() {
    let result = parser()
        .parse(
            "s1",
            "DELETE { GRAPH <urn:g> { <urn:a> <urn:p> \"old\" } } \
             INSERT { GRAPH <urn:g> { ?s <urn:p> \"new\" } } \
             WHERE { GRAPH <urn:g> { ?s <urn:p> \"old\" } }",
        )
        .await;
    assert!(matches!(result, Err(UpdateParseError::NonGroundInsert(_))));
}

#[tokio::test]
async fn load_is_unsupported() {
    let result = parser()
        .parse("s1", "LOAD <http://ex.org/data.nt> INTO GRAPH <urn:g>")
        .await;
    assert!(matches!(result, Err(UpdateParseError::Unsupported(_))));
}

#[tokio::test]
async fn operation_kinds_for_logging() {
    let p = parser();
    let insert = p
        .parse(
            "s1",
            "INSERT DATA { GRAPH <urn:g> { <urn:a> <urn:p> \"v\" } }",
        )
        .await
        .unwrap();
    assert_eq!(insert.operation.kind(), "insert_data");
    assert_eq!(insert.operation.insert_quads().len(), 1);
    assert!(insert.operation.delete_quads().is_empty());

    let delete = p
        .parse(
            "s1",
            "DELETE DATA { GRAPH <urn:g> { <urn:a> <urn:p> \"v\" } }",
        )
        .await
        .unwrap();
    assert_eq!(delete.operation.kind(), "delete_data");
    assert_eq!(delete.operation.delete_quads().len(), 1);
}

#[tokio::test]
async fn language_and_typed_literals_survive_parsing() {
    let parsed = parser()
        .parse(
            "s1",
            r#"INSERT DATA { GRAPH <urn:g> {
                <urn:a> <urn:label> "bonjour"@fr .
                <urn:a> <urn:height> "1.75"^^<http://www.w3.org/2001/XMLSchema#float> .
            } }"#,
        )
        .await
        .unwrap();
    let quads = parsed.operation.insert_quads();
    assert_eq!(quads.len(), 2);

    let vitalgraph::RdfObject::Literal(lang) = &quads[0].object else {
        panic!("expected literal");
    };
    assert_eq!(lang.language(), Some("fr"));

    let vitalgraph::RdfObject::Literal(typed) = &quads[1].object else {
        panic!("expected literal");
    };
    assert_eq!(
        typed.datatype().unwrap().as_str(),
        "http://www.w3.org/2001/XMLSchema#float"
    );
}
