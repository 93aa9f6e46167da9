//! VitalGraph Hybrid Store
//!
//! A multi-tenant RDF graph service keeping two backends consistent for
//! every write: a relational primary store holding the authoritative
//! per-space quad tables, and a SPARQL-over-HTTP index (Fuseki) serving
//! queries. Reads go straight to the index; writes land in both through
//! the dual-write coordinator.
//!
//! # Architecture
//!
//! - [`rdf`]: typed terms and quads (every quad names its graph), the
//!   vocabulary, and the SPARQL wire layer.
//! - [`index`]: pooled, retrying HTTP client for the index, with basic or
//!   Keycloak bearer authentication.
//! - [`primary`]: PostgreSQL persistence — deterministic term UUIDs,
//!   batched term/quad writes, orphan reclamation, the admin registry.
//! - [`sparql`]: the UPDATE parser turning request strings into typed
//!   operations with concrete quad lists.
//! - [`materialize`]: shortcut-triple maintenance for edge objects,
//!   index-only.
//! - [`lock`]: two-layer per-entity locks (in-process mutex + database
//!   advisory lock).
//! - [`coordinator`]: write orchestration — primary first, index second,
//!   divergence reported, never rolled back.
//! - [`backend`]: trait-object factory over the configured backend.
//!
//! # Example
//!
//! ```rust,no_run
//! use vitalgraph::config::VitalGraphConfig;
//! use vitalgraph::backend::create_backend;
//! use vitalgraph::resource;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VitalGraphConfig::from_yaml_file("vitalgraph.yaml")?;
//! let backend = create_backend(&config, resource::global()).await?;
//!
//! backend.create_space_storage("s1").await?;
//! let result = backend
//!     .execute_sparql_update(
//!         "s1",
//!         "INSERT DATA { GRAPH <urn:g1> { <urn:a> <urn:p> \"v\" } }",
//!     )
//!     .await?;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod index;
pub mod lock;
pub mod materialize;
pub mod primary;
pub mod rdf;
pub mod resource;
pub mod sparql;

// Re-export main types for convenience
pub use backend::{create_backend, BackendError, GraphBackend, HybridBackend};
pub use config::{BackendType, VitalGraphConfig};
pub use coordinator::{
    ConsistencyReport, CoordinatorError, CoordinatorResult, DualWriteCoordinator, DualWriteResult,
};
pub use index::{IndexClient, IndexError, IndexResult, SelectBinding};
pub use lock::{uri_lock_key, EntityLockManager, LockError, LockResult};
pub use materialize::{EdgeInfo, EdgeKind, EdgeMaterializer};
pub use primary::{
    term_uuid, GraphRecord, PrimaryStore, PrimaryStoreError, PrimaryStoreResult,
    PrimaryTransaction,
};
pub use rdf::{
    BlankNode, Literal, NamedNode, Quad, RdfError, RdfObject, RdfPredicate, RdfResult, RdfSubject,
    TermInfo, TermKind, Triple,
};
pub use sparql::{ParsedUpdate, UpdateOperation, UpdateParseError, UpdateParser};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "1.0.0");
    }
}
