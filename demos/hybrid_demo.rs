//! End-to-end demo against a running Fuseki + PostgreSQL pair.
//!
//! Expects a `vitalgraph.yaml` in the working directory (or falls back to
//! defaults: Fuseki on localhost:3030, PostgreSQL on localhost:5432).
//!
//! Run with: cargo run --example hybrid_demo

use vitalgraph::backend::create_backend;
use vitalgraph::config::VitalGraphConfig;
use vitalgraph::rdf::{Literal, NamedNode, Quad, RdfPredicate};
use vitalgraph::resource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = VitalGraphConfig::from_yaml_file("vitalgraph.yaml")
        .unwrap_or_else(|_| VitalGraphConfig::default());

    println!("VitalGraph Hybrid Store v{}", vitalgraph::version());
    println!("Index:   {}", config.fuseki.server_url);
    println!("Primary: {}:{}", config.database.host, config.database.port);
    println!();

    let backend = create_backend(&config, resource::global()).await?;

    let space = "demo_space";
    backend.create_space_storage(space).await?;
    println!("Created space: {space}");

    // One quad through the typed path.
    let quad = Quad::new(
        NamedNode::new("http://example.org/alice")?.into(),
        RdfPredicate::new("http://xmlns.com/foaf/0.1/name")?,
        Literal::new_simple_literal("Alice").into(),
        NamedNode::new("http://example.org/graph/people")?,
    );
    let result = backend.add_quads(space, &[quad]).await?;
    println!(
        "add_quads: success={} fuseki_success={}",
        result.success, result.fuseki_success
    );

    // One update through the SPARQL path.
    let result = backend
        .execute_sparql_update(
            space,
            r#"INSERT DATA {
                GRAPH <http://example.org/graph/people> {
                    <http://example.org/alice> <http://xmlns.com/foaf/0.1/age> "30"^^<http://www.w3.org/2001/XMLSchema#int> .
                }
            }"#,
        )
        .await?;
    println!(
        "execute_sparql_update: success={} fuseki_success={}",
        result.success, result.fuseki_success
    );

    // Read back from the index.
    let rows = backend
        .select(
            space,
            "SELECT ?p ?o WHERE { GRAPH ?g { <http://example.org/alice> ?p ?o } }",
        )
        .await?;
    println!("alice has {} properties:", rows.len());
    for row in &rows {
        if let (Some(p), Some(o)) = (row.get("p"), row.get("o")) {
            println!("  {} -> {}", p.value(), o.value());
        }
    }

    let report = backend.verify_consistency(space).await?;
    println!(
        "consistency: primary={} index={} consistent={}",
        report.primary_count, report.index_count, report.consistent
    );

    backend.delete_space_storage(space).await?;
    println!("Deleted space: {space}");

    resource::shutdown_all().await;
    Ok(())
}
