//! Dual-write coordination between the primary store and the index.
//!
//! Every write enters through this module. The ordering contract is not
//! negotiable: materialized triples are filtered out, the primary
//! transaction commits first, then the index is updated, then the edge
//! materializer runs. An index failure after the primary commit does not
//! roll anything back; it degrades the result envelope
//! (`fuseki_success=false`) and logs a `FUSEKI_SYNC_FAILURE` carrying the
//! space id, operation kind, and a correlation id.

use crate::index::{IndexClient, IndexError};
use crate::lock::{EntityLockManager, LockError};
use crate::materialize::{self, EdgeMaterializer};
use crate::primary::{PrimaryStore, PrimaryStoreError, PrimaryTransaction};
use crate::rdf::Quad;
use crate::sparql::{UpdateOperation, UpdateParseError, UpdateParser};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Coordinator errors: the operation did not happen.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// The update string was malformed or unsupported
    #[error("Update parsing failed: {0}")]
    Parse(#[from] UpdateParseError),

    /// The primary store refused the write; the transaction was rolled back
    #[error("Primary store failure: {0}")]
    Primary(#[from] PrimaryStoreError),

    /// An index failure in a context where the index is authoritative
    /// (space lifecycle), not the post-commit mirror path
    #[error("Index failure: {0}")]
    Index(#[from] IndexError),

    /// The entity lock could not be acquired in time
    #[error(transparent)]
    Lock(#[from] LockError),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Result envelope for every write.
///
/// `success` reflects the primary commit; `fuseki_success` reflects
/// whether the index agreed. `success=true, fuseki_success=false` is a
/// reportable divergence, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualWriteResult {
    pub success: bool,
    pub fuseki_success: bool,
    pub message: String,
}

impl DualWriteResult {
    fn ok() -> Self {
        Self {
            success: true,
            fuseki_success: true,
            message: String::new(),
        }
    }

    fn degraded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            fuseki_success: false,
            message: message.into(),
        }
    }
}

/// Consistency check output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub space_id: String,
    pub primary_count: u64,
    pub index_count: u64,
    pub materialized_count: u64,
    pub consistent: bool,
    pub delta: u64,
}

/// Derive a registry display name from a graph URI: the last fragment,
/// path, or scheme-specific segment, clipped to the 255-char column.
pub fn derive_graph_name(graph_uri: &str) -> String {
    let name = if let Some((_, frag)) = graph_uri.rsplit_once('#') {
        frag
    } else if let Some((_, seg)) = graph_uri.rsplit_once('/') {
        seg
    } else if let Some((_, seg)) = graph_uri.rsplit_once(':') {
        seg
    } else {
        graph_uri
    };
    let name = if name.is_empty() { graph_uri } else { name };
    name.chars().take(255).collect()
}

/// The single orchestration entry point for every write.
pub struct DualWriteCoordinator {
    index: Arc<IndexClient>,
    primary: Arc<PrimaryStore>,
    parser: UpdateParser,
    materializer: EdgeMaterializer,
    locks: Arc<EntityLockManager>,
}

impl DualWriteCoordinator {
    pub fn new(
        index: Arc<IndexClient>,
        primary: Arc<PrimaryStore>,
        locks: Arc<EntityLockManager>,
    ) -> Self {
        Self {
            parser: UpdateParser::new(index.clone()),
            materializer: EdgeMaterializer::new(index.clone()),
            index,
            primary,
            locks,
        }
    }

    /// Startup: make sure the admin schema exists and every registered
    /// space has its index dataset.
    pub async fn initialize(&self) -> CoordinatorResult<()> {
        self.primary.initialize_admin_schema().await?;
        let spaces = self.primary.list_space_ids().await?;
        self.index.ensure_datasets_registered(&spaces).await?;
        Ok(())
    }

    // --- SPARQL UPDATE path ---

    /// Parse and execute a SPARQL UPDATE against both backends.
    ///
    /// `original_quads`, when supplied by a caller that already holds the
    /// typed quads an INSERT was built from, are used for the index write
    /// so literal metadata survives re-serialization.
    pub async fn execute_sparql_update(
        &self,
        space_id: &str,
        raw_update: &str,
        original_quads: Option<&[Quad]>,
    ) -> CoordinatorResult<DualWriteResult> {
        let correlation_id = Uuid::new_v4();
        debug!(space_id, %correlation_id, update = raw_update, "Executing SPARQL UPDATE");
        let parsed = self.parser.parse(space_id, raw_update).await?;

        match &parsed.operation {
            UpdateOperation::InsertData { .. }
            | UpdateOperation::DeleteData { .. }
            | UpdateOperation::Modify { .. } => {
                self.apply_data_operation(space_id, &parsed.operation, &parsed.raw_update, original_quads, correlation_id)
                    .await
            }
            UpdateOperation::DropGraph { graph } | UpdateOperation::ClearGraph { graph } => {
                // The primary is authoritative: the graph's quads go first,
                // then the raw update is forwarded to the index.
                let mut tx = self.primary.begin().await?;
                let removed = self
                    .primary
                    .delete_graph_quads(space_id, graph.as_str(), &mut tx)
                    .await?;
                tx.commit().await?;
                info!(
                    space_id,
                    graph = graph.as_str(),
                    removed,
                    kind = parsed.operation.kind(),
                    "Graph quads removed from primary"
                );
                match self.index.update(space_id, &parsed.raw_update).await {
                    Ok(()) => Ok(DualWriteResult::ok()),
                    Err(e) => Ok(self.report_sync_failure(
                        space_id,
                        parsed.operation.kind(),
                        correlation_id,
                        &e,
                    )),
                }
            }
            UpdateOperation::CreateGraph { graph } => {
                self.ensure_graph_registered(space_id, graph.as_str()).await;
                match self.index.update(space_id, &parsed.raw_update).await {
                    Ok(()) => Ok(DualWriteResult::ok()),
                    Err(e) => Ok(self.report_sync_failure(
                        space_id,
                        parsed.operation.kind(),
                        correlation_id,
                        &e,
                    )),
                }
            }
        }
    }

    /// Shared path for InsertData / DeleteData / Modify.
    async fn apply_data_operation(
        &self,
        space_id: &str,
        operation: &UpdateOperation,
        raw_update: &str,
        original_quads: Option<&[Quad]>,
        correlation_id: Uuid,
    ) -> CoordinatorResult<DualWriteResult> {
        let kind = operation.kind();
        let insert_quads = operation.insert_quads();
        let delete_quads = operation.delete_quads();

        for graph_uri in operation.insert_graph_uris() {
            self.ensure_graph_registered(space_id, &graph_uri).await;
        }

        // Shortcut triples never reach the primary.
        let (primary_deletes, _) = materialize::filter_materialized(delete_quads);
        let (primary_inserts, _) = materialize::filter_materialized(insert_quads);

        let mut tx = self.primary.begin().await?;
        if !primary_deletes.is_empty() {
            self.primary
                .remove_quads(space_id, &primary_deletes, &mut tx, false)
                .await?;
        }
        if !primary_inserts.is_empty() {
            self.primary
                .store_quads(space_id, &primary_inserts, &mut tx)
                .await?;
        }
        tx.commit().await?;
        debug!(space_id, kind, "Primary committed");

        // Index side. Pure inserts are re-emitted as INSERT DATA (with
        // float promotion); anything with a delete side forwards the raw
        // update so the index applies it in one request.
        let index_result = match operation {
            UpdateOperation::InsertData { quads } => {
                let for_index = original_quads.unwrap_or(quads);
                self.index.insert_data(space_id, for_index, true).await
            }
            _ => self.index.update(space_id, raw_update).await,
        };

        let result = match index_result {
            Ok(()) => DualWriteResult::ok(),
            Err(e) => self.report_sync_failure(space_id, kind, correlation_id, &e),
        };

        if result.fuseki_success {
            self.materializer
                .materialize(space_id, insert_quads, delete_quads)
                .await;
        }
        Ok(result)
    }

    // --- typed quad paths ---

    /// Insert quads into both backends.
    ///
    /// With a caller-provided transaction, all primary work happens inside
    /// it uncommitted and the index write is left to the caller for after
    /// their commit, preserving the primary-first ordering contract.
    pub async fn add_quads(
        &self,
        space_id: &str,
        quads: &[Quad],
        caller_tx: Option<&mut PrimaryTransaction>,
    ) -> CoordinatorResult<DualWriteResult> {
        if quads.is_empty() {
            return Ok(DualWriteResult::ok());
        }
        let correlation_id = Uuid::new_v4();
        debug!(space_id, count = quads.len(), %correlation_id, "add_quads");

        for graph_uri in graph_uris(quads) {
            self.ensure_graph_registered(space_id, &graph_uri).await;
        }

        let (filtered, _) = materialize::filter_materialized(quads);

        if let Some(tx) = caller_tx {
            self.primary.store_quads(space_id, &filtered, tx).await?;
            return Ok(DualWriteResult {
                success: true,
                fuseki_success: true,
                message: "index write deferred to transaction owner".to_string(),
            });
        }

        if !filtered.is_empty() {
            let mut tx = self.primary.begin().await?;
            self.primary.store_quads(space_id, &filtered, &mut tx).await?;
            tx.commit().await?;
        }

        // The index receives the unfiltered batch: shortcut triples are
        // legitimate index content.
        let result = match self.index.insert_data(space_id, quads, true).await {
            Ok(()) => DualWriteResult::ok(),
            Err(e) => self.report_sync_failure(space_id, "add_quads", correlation_id, &e),
        };
        if result.fuseki_success {
            self.materializer.materialize(space_id, quads, &[]).await;
        }
        Ok(result)
    }

    /// Remove quads from both backends.
    pub async fn remove_quads(
        &self,
        space_id: &str,
        quads: &[Quad],
        caller_tx: Option<&mut PrimaryTransaction>,
    ) -> CoordinatorResult<DualWriteResult> {
        if quads.is_empty() {
            return Ok(DualWriteResult::ok());
        }
        let correlation_id = Uuid::new_v4();
        debug!(space_id, count = quads.len(), %correlation_id, "remove_quads");

        let (filtered, _) = materialize::filter_materialized(quads);

        if let Some(tx) = caller_tx {
            if !filtered.is_empty() {
                self.primary.remove_quads(space_id, &filtered, tx, false).await?;
            }
            return Ok(DualWriteResult {
                success: true,
                fuseki_success: true,
                message: "index write deferred to transaction owner".to_string(),
            });
        }

        if !filtered.is_empty() {
            let mut tx = self.primary.begin().await?;
            self.primary
                .remove_quads(space_id, &filtered, &mut tx, false)
                .await?;
            tx.commit().await?;
        }

        let result = match self.index.delete_data(space_id, quads).await {
            Ok(()) => DualWriteResult::ok(),
            Err(e) => self.report_sync_failure(space_id, "remove_quads", correlation_id, &e),
        };
        if result.fuseki_success {
            self.materializer.materialize(space_id, &[], quads).await;
        }
        Ok(result)
    }

    /// Atomic delete + insert.
    ///
    /// Both primary operations share one transaction, and the index
    /// receives a single `DELETE DATA ; INSERT DATA` request, so no reader
    /// ever observes the window where the old value is gone and the new
    /// one has not landed. The orphan sweep is skipped inside the shared
    /// transaction since the insert may re-reference the swept terms.
    pub async fn update_quads(
        &self,
        space_id: &str,
        delete_quads: &[Quad],
        insert_quads: &[Quad],
    ) -> CoordinatorResult<DualWriteResult> {
        let correlation_id = Uuid::new_v4();
        debug!(
            space_id,
            deletes = delete_quads.len(),
            inserts = insert_quads.len(),
            %correlation_id,
            "update_quads"
        );

        for graph_uri in graph_uris(insert_quads) {
            self.ensure_graph_registered(space_id, &graph_uri).await;
        }

        let (primary_deletes, _) = materialize::filter_materialized(delete_quads);
        let (primary_inserts, _) = materialize::filter_materialized(insert_quads);

        let mut tx = self.primary.begin().await?;
        if !primary_deletes.is_empty() {
            self.primary
                .remove_quads(space_id, &primary_deletes, &mut tx, true)
                .await?;
        }
        if !primary_inserts.is_empty() {
            self.primary
                .store_quads(space_id, &primary_inserts, &mut tx)
                .await?;
        }
        tx.commit().await?;
        debug!(space_id, "update_quads primary committed");

        // One atomic request: DELETE DATA ; INSERT DATA.
        let mut parts = Vec::new();
        if !delete_quads.is_empty() {
            parts.push(crate::rdf::wire::delete_data_update(delete_quads));
        }
        if !insert_quads.is_empty() {
            parts.push(crate::rdf::wire::insert_data_update(insert_quads, true));
        }

        let result = if parts.is_empty() {
            DualWriteResult::ok()
        } else {
            match self.index.update(space_id, &parts.join(" ;\n")).await {
                Ok(()) => DualWriteResult::ok(),
                Err(e) => self.report_sync_failure(space_id, "update_quads", correlation_id, &e),
            }
        };
        if result.fuseki_success {
            self.materializer
                .materialize(space_id, insert_quads, delete_quads)
                .await;
        }
        Ok(result)
    }

    /// `update_quads` serialized on an entity URI across all instances.
    pub async fn update_entity(
        &self,
        space_id: &str,
        entity_uri: &str,
        delete_quads: &[Quad],
        insert_quads: &[Quad],
    ) -> CoordinatorResult<DualWriteResult> {
        let _guard = self.locks.lock(entity_uri).await?;
        self.update_quads(space_id, delete_quads, insert_quads).await
    }

    // --- space lifecycle ---

    /// Create storage for a new space: primary schema first, then the
    /// index dataset. If the dataset creation fails, the schema is rolled
    /// back and the error is returned.
    pub async fn create_space_storage(&self, space_id: &str) -> CoordinatorResult<()> {
        info!(space_id, "Creating space storage");
        self.primary
            .create_space_record(space_id, space_id, None)
            .await?;
        self.primary.create_space_tables(space_id).await?;

        if let Err(e) = self.index.create_dataset(space_id).await {
            error!(space_id, error = %e, "Index dataset creation failed, rolling back primary schema");
            if let Err(rollback_err) = self.primary.drop_space_tables(space_id).await {
                error!(space_id, error = %rollback_err, "Primary schema rollback also failed");
            }
            if let Err(record_err) = self.primary.delete_space_record(space_id).await {
                error!(space_id, error = %record_err, "Space record cleanup failed");
            }
            return Err(e.into());
        }
        info!(space_id, "Space storage created");
        Ok(())
    }

    /// Delete a space's storage: index dataset, then primary schema, then
    /// admin metadata. Partial failures are logged, not rolled back, and
    /// a second call is a no-op.
    pub async fn delete_space_storage(&self, space_id: &str) -> CoordinatorResult<()> {
        info!(space_id, "Deleting space storage");
        if let Err(e) = self.index.delete_dataset(space_id).await {
            warn!(space_id, error = %e, "Index dataset deletion failed, continuing");
        }
        if let Err(e) = self.primary.drop_space_tables(space_id).await {
            warn!(space_id, error = %e, "Primary schema drop failed, continuing");
        }
        if let Err(e) = self.primary.delete_space_record(space_id).await {
            warn!(space_id, error = %e, "Space record deletion failed");
        }
        info!(space_id, "Space storage deleted");
        Ok(())
    }

    /// Compare primary and index quad counts. Shortcut triples are
    /// discounted from the index side since they legitimately exist only
    /// there.
    pub async fn verify_consistency(&self, space_id: &str) -> CoordinatorResult<ConsistencyReport> {
        let primary_count = self.primary.count_quads(space_id, None).await?;
        let index_count = self.index.count(space_id, None).await?;
        let materialized_count = self.index.count_materialized(space_id).await?;
        let adjusted = index_count.saturating_sub(materialized_count);
        let consistent = primary_count == adjusted;
        let delta = primary_count.abs_diff(adjusted);
        if !consistent {
            warn!(
                space_id,
                primary_count, index_count, materialized_count, delta,
                "Consistency check failed"
            );
        }
        Ok(ConsistencyReport {
            space_id: space_id.to_string(),
            primary_count,
            index_count,
            materialized_count,
            consistent,
            delta,
        })
    }

    // --- helpers ---

    /// Register a graph in the admin registry if it is not there yet.
    /// Registration failures are logged but never fail the write: a race
    /// with another instance surfaces as an ignored unique violation.
    async fn ensure_graph_registered(&self, space_id: &str, graph_uri: &str) {
        match self.primary.get_graph(space_id, graph_uri).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let name = derive_graph_name(graph_uri);
                if let Err(e) = self.primary.register_graph(space_id, graph_uri, &name).await {
                    warn!(space_id, graph_uri, error = %e, "Graph auto-registration failed");
                }
            }
            Err(e) => {
                warn!(space_id, graph_uri, error = %e, "Graph registry lookup failed");
            }
        }
    }

    fn report_sync_failure(
        &self,
        space_id: &str,
        kind: &str,
        correlation_id: Uuid,
        cause: &IndexError,
    ) -> DualWriteResult {
        error!(
            space_id,
            operation = kind,
            %correlation_id,
            error = %cause,
            "FUSEKI_SYNC_FAILURE: index write failed after primary commit; primary not rolled back"
        );
        DualWriteResult::degraded(format!(
            "FUSEKI_SYNC_FAILURE: index {kind} failed for space {space_id} (correlation {correlation_id})"
        ))
    }
}

/// Distinct graph URIs in a quad batch, in first-seen order.
fn graph_uris(quads: &[Quad]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut uris = Vec::new();
    for quad in quads {
        let uri = quad.graph.as_str().to_string();
        if seen.insert(uri.clone()) {
            uris.push(uri);
        }
    }
    uris
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{Literal, NamedNode, RdfPredicate};

    #[test]
    fn test_derive_graph_name() {
        assert_eq!(
            derive_graph_name("urn:multi_org_crud_graph"),
            "multi_org_crud_graph"
        );
        assert_eq!(
            derive_graph_name("http://example.org/graphs/my_graph"),
            "my_graph"
        );
        assert_eq!(derive_graph_name("haley:test_graph"), "test_graph");
        assert_eq!(
            derive_graph_name("http://example.org/g#fragment"),
            "fragment"
        );
        assert_eq!(derive_graph_name("plainname"), "plainname");
    }

    #[test]
    fn test_derive_graph_name_clips_to_255() {
        let long = format!("urn:{}", "x".repeat(400));
        assert_eq!(derive_graph_name(&long).len(), 255);
    }

    #[test]
    fn test_graph_uris_first_seen_order() {
        let g1 = NamedNode::new("http://g.org/1").unwrap();
        let g2 = NamedNode::new("http://g.org/2").unwrap();
        let make = |g: &NamedNode| {
            Quad::new(
                NamedNode::new("http://ex.org/s").unwrap().into(),
                RdfPredicate::new("http://ex.org/p").unwrap(),
                Literal::new_simple_literal("v").into(),
                g.clone(),
            )
        };
        let quads = vec![make(&g1), make(&g2), make(&g1)];
        assert_eq!(
            graph_uris(&quads),
            vec!["http://g.org/1".to_string(), "http://g.org/2".to_string()]
        );
    }

    #[test]
    fn test_result_envelope() {
        let ok = DualWriteResult::ok();
        assert!(ok.success && ok.fuseki_success && ok.message.is_empty());

        let degraded = DualWriteResult::degraded("FUSEKI_SYNC_FAILURE: x");
        assert!(degraded.success);
        assert!(!degraded.fuseki_success);
        assert!(degraded.message.contains("FUSEKI_SYNC_FAILURE"));
    }
}
