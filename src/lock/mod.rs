//! Entity-level advisory locks.
//!
//! Writes touching the same entity URI are serialized by two layers:
//!
//! 1. A per-key in-process `tokio::sync::Mutex`. Required because
//!    session-level advisory locks are reentrant on the same connection:
//!    two tasks on one instance would both see `pg_try_advisory_lock`
//!    return true.
//! 2. A PostgreSQL advisory lock on a 64-bit key derived from the URI,
//!    coordinating across service instances sharing the database.
//!
//! All advisory locks live on one dedicated long-lived connection, SQL on
//! which is serialized by its own mutex. If that connection drops, the
//! server has already released every lock it held, so the bookkeeping is
//! cleared and the connection re-established lazily.

use crate::config::DatabaseConfig;
use sha2::{Digest, Sha256};
use sqlx::{Connection, PgConnection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Lock acquisition errors
#[derive(Error, Debug)]
pub enum LockError {
    /// The lock could not be acquired within its deadline. Distinct from
    /// transient errors: the operation must fail, not retry.
    #[error("Could not acquire entity lock for {uri} within {timeout:?}")]
    Timeout { uri: String, timeout: Duration },

    /// The lock connection failed
    #[error("Lock connection error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type LockResult<T> = Result<T, LockError>;

/// Default acquisition deadline.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);
/// Poll interval for the advisory-lock retry loop.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Stable 64-bit advisory lock key for a URI: the first 8 bytes of
/// SHA-256, interpreted as a big-endian signed integer.
pub fn uri_lock_key(uri: &str) -> i64 {
    let digest = Sha256::digest(uri.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}

struct LockInner {
    connect_url: String,
    /// Dedicated lock connection; all SQL on it goes through this mutex.
    conn: Mutex<Option<PgConnection>>,
    /// Per-key local mutexes; the map itself is guarded separately and
    /// only held for lookup/insert.
    entity_locks: StdMutex<HashMap<i64, Arc<Mutex<()>>>>,
    held: StdMutex<HashMap<i64, String>>,
}

impl LockInner {
    /// Run `pg_try_advisory_lock` once on the shared connection,
    /// reconnecting lazily if it was lost.
    async fn try_advisory_lock(&self, key: i64) -> bool {
        let mut guard = self.conn.lock().await;
        if guard.is_none() {
            // Reconnect: the server released everything the old
            // connection held.
            self.held.lock().expect("held map poisoned").clear();
            match PgConnection::connect(&self.connect_url).await {
                Ok(conn) => {
                    info!("Entity lock connection established");
                    *guard = Some(conn);
                }
                Err(e) => {
                    warn!(error = %e, "Cannot establish entity lock connection");
                    return false;
                }
            }
        }
        let conn = guard.as_mut().expect("lock connection present");
        match sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_lock($1)")
            .bind(key)
            .fetch_one(conn)
            .await
        {
            Ok(acquired) => acquired,
            Err(e) => {
                warn!(error = %e, "Advisory lock query failed, dropping lock connection");
                *guard = None;
                false
            }
        }
    }

    async fn release_advisory_lock(&self, key: i64, uri: &str) {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_mut() {
            if let Err(e) = sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock($1)")
                .bind(key)
                .fetch_one(conn)
                .await
            {
                warn!(uri, error = %e, "Advisory unlock failed, dropping lock connection");
                *guard = None;
            } else {
                debug!(uri, key, "Advisory lock released");
            }
        }
        self.held.lock().expect("held map poisoned").remove(&key);
    }

    fn local_mutex(&self, key: i64) -> Arc<Mutex<()>> {
        let mut map = self.entity_locks.lock().expect("entity lock map poisoned");
        map.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

/// Holds an entity lock; releasing happens on drop, advisory lock first,
/// then the in-process mutex.
pub struct EntityLockGuard {
    inner: Arc<LockInner>,
    key: i64,
    uri: String,
    local: Option<OwnedMutexGuard<()>>,
}

impl Drop for EntityLockGuard {
    fn drop(&mut self) {
        let Some(local) = self.local.take() else {
            return;
        };
        let inner = self.inner.clone();
        let key = self.key;
        let uri = std::mem::take(&mut self.uri);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    inner.release_advisory_lock(key, &uri).await;
                    drop(local);
                });
            }
            Err(_) => {
                // No runtime on this thread. The lock connection is still
                // alive, so skipping the unlock would strand the advisory
                // lock for every later writer of this URI; run the release
                // on a throwaway current-thread runtime instead. The local
                // guard is held until the advisory lock is gone.
                std::thread::spawn(move || {
                    match tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                    {
                        Ok(runtime) => {
                            runtime.block_on(inner.release_advisory_lock(key, &uri));
                        }
                        Err(e) => {
                            warn!(uri = %uri, key, error = %e, "Cannot release advisory lock without a runtime");
                        }
                    }
                    drop(local);
                });
            }
        }
    }
}

/// Manages entity-level locks via one dedicated lock connection.
pub struct EntityLockManager {
    inner: Arc<LockInner>,
}

impl EntityLockManager {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            inner: Arc::new(LockInner {
                connect_url: config.connect_url(),
                conn: Mutex::new(None),
                entity_locks: StdMutex::new(HashMap::new()),
                held: StdMutex::new(HashMap::new()),
            }),
        }
    }

    /// Acquire the lock for an entity URI with the default 10s deadline.
    pub async fn lock(&self, entity_uri: &str) -> LockResult<EntityLockGuard> {
        self.lock_with_timeout(entity_uri, DEFAULT_LOCK_TIMEOUT).await
    }

    /// Acquire the lock for an entity URI, waiting at most `timeout`.
    pub async fn lock_with_timeout(
        &self,
        entity_uri: &str,
        timeout: Duration,
    ) -> LockResult<EntityLockGuard> {
        let key = uri_lock_key(entity_uri);
        let start = Instant::now();

        // Layer 1: serialize within this process.
        let local_mutex = self.inner.local_mutex(key);
        let local = tokio::time::timeout(timeout, local_mutex.lock_owned())
            .await
            .map_err(|_| LockError::Timeout {
                uri: entity_uri.to_string(),
                timeout,
            })?;
        debug!(
            uri = entity_uri,
            key,
            wait_ms = start.elapsed().as_millis() as u64,
            "Local entity lock acquired"
        );

        // Layer 2: coordinate across instances. Poll until the deadline.
        let deadline = start + timeout;
        loop {
            if self.inner.try_advisory_lock(key).await {
                self.inner
                    .held
                    .lock()
                    .expect("held map poisoned")
                    .insert(key, entity_uri.to_string());
                debug!(
                    uri = entity_uri,
                    key,
                    wait_ms = start.elapsed().as_millis() as u64,
                    "Entity lock acquired"
                );
                return Ok(EntityLockGuard {
                    inner: self.inner.clone(),
                    key,
                    uri: entity_uri.to_string(),
                    local: Some(local),
                });
            }
            if Instant::now() >= deadline {
                // The local guard drops here, releasing layer 1.
                return Err(LockError::Timeout {
                    uri: entity_uri.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Number of advisory locks this instance currently holds.
    pub fn active_lock_count(&self) -> usize {
        self.inner.held.lock().expect("held map poisoned").len()
    }

    /// Close the lock connection; the server releases all held locks.
    pub async fn disconnect(&self) {
        let mut guard = self.inner.conn.lock().await;
        if let Some(conn) = guard.take() {
            if let Err(e) = conn.close().await {
                warn!(error = %e, "Error closing lock connection");
            }
        }
        self.inner.held.lock().expect("held map poisoned").clear();
        info!("Entity lock manager disconnected, all locks released");
    }
}
