//! Process-wide resource registry.
//!
//! Connection pools and the lock manager's dedicated connection are
//! registered here so shutdown can close them in order with bounded
//! timeouts: pools first (draining checked-out connections), then bare
//! connections. HTTP clients close their sockets on drop and need no
//! registration.

use crate::lock::EntityLockManager;
use sqlx::PgPool;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tracing::{info, warn};

/// Default per-resource close budget.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tracks closeable resources for orderly shutdown.
#[derive(Default)]
pub struct ResourceRegistry {
    pools: Mutex<Vec<PgPool>>,
    lock_managers: Mutex<Vec<Arc<EntityLockManager>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a connection pool.
    pub fn register_pool(&self, pool: PgPool) {
        self.pools.lock().expect("pool list poisoned").push(pool);
    }

    /// Track a lock manager (owns one bare connection).
    pub fn register_lock_manager(&self, manager: Arc<EntityLockManager>) {
        self.lock_managers
            .lock()
            .expect("lock manager list poisoned")
            .push(manager);
    }

    /// Close everything: pools first, then bare connections. Each close
    /// gets a bounded timeout; a straggler is logged and abandoned rather
    /// than blocking shutdown.
    pub async fn shutdown(&self, close_timeout: Duration) {
        let pools: Vec<PgPool> = self.pools.lock().expect("pool list poisoned").drain(..).collect();
        for pool in pools {
            match tokio::time::timeout(close_timeout, pool.close()).await {
                Ok(()) => info!("Connection pool closed"),
                Err(_) => warn!("Connection pool did not close in time, abandoning"),
            }
        }

        let managers: Vec<Arc<EntityLockManager>> = self
            .lock_managers
            .lock()
            .expect("lock manager list poisoned")
            .drain(..)
            .collect();
        for manager in managers {
            match tokio::time::timeout(close_timeout, manager.disconnect()).await {
                Ok(()) => info!("Lock connection closed"),
                Err(_) => warn!("Lock connection did not close in time, abandoning"),
            }
        }
    }
}

static GLOBAL_REGISTRY: OnceLock<ResourceRegistry> = OnceLock::new();

/// The process-wide registry.
pub fn global() -> &'static ResourceRegistry {
    GLOBAL_REGISTRY.get_or_init(ResourceRegistry::new)
}

/// Close everything tracked by the global registry.
pub async fn shutdown_all() {
    global().shutdown(DEFAULT_CLOSE_TIMEOUT).await;
}
