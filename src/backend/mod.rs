//! Backend selection.
//!
//! The configuration carries a backend tag; the factory turns it into a
//! trait object so callers never name a concrete backend. Only the hybrid
//! `fuseki_postgresql` backend is constructible in this crate.

use crate::config::{BackendType, VitalGraphConfig};
use crate::coordinator::{
    ConsistencyReport, CoordinatorResult, DualWriteCoordinator, DualWriteResult,
};
use crate::index::{IndexClient, IndexError, IndexResult, SelectBinding};
use crate::lock::EntityLockManager;
use crate::primary::{PrimaryStore, PrimaryStoreError};
use crate::rdf::{Quad, Triple};
use crate::resource::ResourceRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Backend construction errors
#[derive(Error, Debug)]
pub enum BackendError {
    /// The configured backend is not available in this build
    #[error("Unsupported backend type: {0:?}")]
    Unsupported(BackendType),

    /// Index client construction failed
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Primary store connection failed
    #[error(transparent)]
    Primary(#[from] PrimaryStoreError),
}

/// Write surface plus read passthrough, independent of the storage choice.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    async fn execute_sparql_update(
        &self,
        space_id: &str,
        update: &str,
    ) -> CoordinatorResult<DualWriteResult>;
    async fn add_quads(&self, space_id: &str, quads: &[Quad])
        -> CoordinatorResult<DualWriteResult>;
    async fn remove_quads(
        &self,
        space_id: &str,
        quads: &[Quad],
    ) -> CoordinatorResult<DualWriteResult>;
    async fn update_quads(
        &self,
        space_id: &str,
        delete_quads: &[Quad],
        insert_quads: &[Quad],
    ) -> CoordinatorResult<DualWriteResult>;
    async fn update_entity(
        &self,
        space_id: &str,
        entity_uri: &str,
        delete_quads: &[Quad],
        insert_quads: &[Quad],
    ) -> CoordinatorResult<DualWriteResult>;
    async fn create_space_storage(&self, space_id: &str) -> CoordinatorResult<()>;
    async fn delete_space_storage(&self, space_id: &str) -> CoordinatorResult<()>;
    async fn verify_consistency(&self, space_id: &str) -> CoordinatorResult<ConsistencyReport>;

    /// Reads bypass the coordinator and hit the index directly.
    async fn select(&self, space_id: &str, sparql: &str) -> IndexResult<Vec<SelectBinding>>;
    async fn construct(&self, space_id: &str, sparql: &str) -> IndexResult<Vec<Triple>>;
    async fn ask(&self, space_id: &str, sparql: &str) -> IndexResult<bool>;
}

/// The hybrid backend: PostgreSQL primary plus SPARQL index.
pub struct HybridBackend {
    coordinator: DualWriteCoordinator,
    index: Arc<IndexClient>,
}

impl HybridBackend {
    /// Connect both stores and wire the coordinator.
    pub async fn connect(
        config: &VitalGraphConfig,
        resources: &ResourceRegistry,
    ) -> Result<Self, BackendError> {
        let index = Arc::new(IndexClient::new(&config.fuseki)?);
        let primary = Arc::new(PrimaryStore::connect(&config.database).await?);
        let locks = Arc::new(EntityLockManager::new(&config.database));

        resources.register_pool(primary.pool().clone());
        resources.register_lock_manager(locks.clone());

        let coordinator = DualWriteCoordinator::new(index.clone(), primary, locks);
        coordinator.initialize().await.map_err(|e| match e {
            crate::coordinator::CoordinatorError::Primary(p) => BackendError::Primary(p),
            crate::coordinator::CoordinatorError::Index(i) => BackendError::Index(i),
            other => BackendError::Index(IndexError::Response(other.to_string())),
        })?;

        Ok(Self { coordinator, index })
    }

    /// The coordinator, for callers that manage their own transactions.
    pub fn coordinator(&self) -> &DualWriteCoordinator {
        &self.coordinator
    }
}

#[async_trait]
impl GraphBackend for HybridBackend {
    async fn execute_sparql_update(
        &self,
        space_id: &str,
        update: &str,
    ) -> CoordinatorResult<DualWriteResult> {
        self.coordinator
            .execute_sparql_update(space_id, update, None)
            .await
    }

    async fn add_quads(
        &self,
        space_id: &str,
        quads: &[Quad],
    ) -> CoordinatorResult<DualWriteResult> {
        self.coordinator.add_quads(space_id, quads, None).await
    }

    async fn remove_quads(
        &self,
        space_id: &str,
        quads: &[Quad],
    ) -> CoordinatorResult<DualWriteResult> {
        self.coordinator.remove_quads(space_id, quads, None).await
    }

    async fn update_quads(
        &self,
        space_id: &str,
        delete_quads: &[Quad],
        insert_quads: &[Quad],
    ) -> CoordinatorResult<DualWriteResult> {
        self.coordinator
            .update_quads(space_id, delete_quads, insert_quads)
            .await
    }

    async fn update_entity(
        &self,
        space_id: &str,
        entity_uri: &str,
        delete_quads: &[Quad],
        insert_quads: &[Quad],
    ) -> CoordinatorResult<DualWriteResult> {
        self.coordinator
            .update_entity(space_id, entity_uri, delete_quads, insert_quads)
            .await
    }

    async fn create_space_storage(&self, space_id: &str) -> CoordinatorResult<()> {
        self.coordinator.create_space_storage(space_id).await
    }

    async fn delete_space_storage(&self, space_id: &str) -> CoordinatorResult<()> {
        self.coordinator.delete_space_storage(space_id).await
    }

    async fn verify_consistency(&self, space_id: &str) -> CoordinatorResult<ConsistencyReport> {
        self.coordinator.verify_consistency(space_id).await
    }

    async fn select(&self, space_id: &str, sparql: &str) -> IndexResult<Vec<SelectBinding>> {
        self.index.select(space_id, sparql).await
    }

    async fn construct(&self, space_id: &str, sparql: &str) -> IndexResult<Vec<Triple>> {
        self.index.construct(space_id, sparql).await
    }

    async fn ask(&self, space_id: &str, sparql: &str) -> IndexResult<bool> {
        self.index.ask(space_id, sparql).await
    }
}

/// Create the backend selected by the configuration.
pub async fn create_backend(
    config: &VitalGraphConfig,
    resources: &ResourceRegistry,
) -> Result<Arc<dyn GraphBackend>, BackendError> {
    match config.backend.backend_type {
        BackendType::FusekiPostgresql => {
            info!("Creating fuseki_postgresql hybrid backend");
            Ok(Arc::new(HybridBackend::connect(config, resources).await?))
        }
        other => Err(BackendError::Unsupported(other)),
    }
}
