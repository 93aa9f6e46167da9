//! Authoritative relational storage for terms and quads.
//!
//! Every space owns a pair of tables (`<space>_term`, `<space>_rdf_quad`)
//! holding the primary copy of its RDF data; the admin tables register
//! spaces, graphs, and users. All rows are partitioned by the `dataset`
//! column, which is always `'primary'` today.

pub mod schema;

use crate::config::DatabaseConfig;
use crate::rdf::{Quad, RdfObject, TermInfo};
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Primary store errors
#[derive(Error, Debug)]
pub enum PrimaryStoreError {
    /// Underlying database failure
    #[error("Primary database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Space id cannot be used as a table-name prefix
    #[error("Invalid space id: {0}")]
    InvalidSpaceId(String),

    /// A delete referenced terms the store has never seen
    #[error("Cannot resolve {count} term(s) for delete, first missing: {sample}")]
    UnresolvedTerms { count: usize, sample: String },
}

pub type PrimaryStoreResult<T> = Result<T, PrimaryStoreError>;

/// Rows per batched INSERT/DELETE statement.
const BATCH_SIZE: usize = 1000;

/// Deterministic 128-bit term identifier.
///
/// First 16 bytes of SHA-256 over
/// `text 0x1F kind 0x1F lang 0x1F datatype_id_be`, so identical terms map
/// to the same UUID regardless of how they were serialized at the wire.
/// The scheme is a compile-time constant.
pub fn term_uuid(info: &TermInfo) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(info.text.as_bytes());
    hasher.update([0x1F]);
    hasher.update([info.kind.as_char() as u8]);
    hasher.update([0x1F]);
    hasher.update(info.lang.as_deref().unwrap_or("").as_bytes());
    hasher.update([0x1F]);
    hasher.update(datatype_id(info).unwrap_or(0).to_be_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

/// Stable 64-bit id for a datatype IRI (first 8 bytes of SHA-256, signed
/// big-endian). Plain and language-tagged literals carry no datatype id.
pub fn datatype_id(info: &TermInfo) -> Option<i64> {
    info.datatype.as_ref().map(|iri| {
        let digest = Sha256::digest(iri.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        i64::from_be_bytes(bytes)
    })
}

/// Reject space ids that cannot be spliced into table names.
pub fn validate_space_id(space_id: &str) -> PrimaryStoreResult<()> {
    let mut chars = space_id.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars
            .all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    };
    if valid && space_id.len() <= 64 {
        Ok(())
    } else {
        Err(PrimaryStoreError::InvalidSpaceId(space_id.to_string()))
    }
}

/// Numeric prefix pattern used to recover index-truncated float literals:
/// drop the last character and match on the rest. Only values that parse
/// as numbers with a decimal point qualify.
fn numeric_prefix_pattern(text: &str) -> Option<String> {
    text.parse::<f64>().ok()?;
    if text.contains('.') && text.len() > 1 {
        Some(format!("{}%", &text[..text.len() - 1]))
    } else {
        None
    }
}

/// 1% relative tolerance for float-precision drift.
fn within_one_percent(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    ((a - b) / scale).abs() < 0.01
}

/// A graph registry row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRecord {
    pub graph_uri: String,
    pub graph_name: String,
}

/// An open primary-store transaction.
///
/// The connection is checked out of the pool for the guard's lifetime and
/// returned on every exit path; dropping the guard without committing
/// rolls the transaction back.
pub struct PrimaryTransaction {
    inner: sqlx::Transaction<'static, Postgres>,
}

impl PrimaryTransaction {
    /// Commit and return the connection to the pool.
    pub async fn commit(self) -> PrimaryStoreResult<()> {
        self.inner.commit().await?;
        Ok(())
    }

    /// Roll back and return the connection to the pool.
    pub async fn rollback(self) -> PrimaryStoreResult<()> {
        self.inner.rollback().await?;
        Ok(())
    }
}

/// Pooled client for the primary PostgreSQL store.
pub struct PrimaryStore {
    pool: PgPool,
    enable_quad_logging: bool,
}

impl PrimaryStore {
    /// Connect the pool using the configured sizing.
    pub async fn connect(config: &DatabaseConfig) -> PrimaryStoreResult<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min)
            .max_connections(config.pool.max)
            .connect(&config.connect_url())
            .await?;
        info!(
            host = %config.host,
            database = %config.database,
            pool_max = config.pool.max,
            "Primary store connected"
        );
        Ok(Self {
            pool,
            enable_quad_logging: config.enable_quad_logging,
        })
    }

    /// Build a store around an existing pool (tests, embedding).
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            enable_quad_logging: false,
        }
    }

    /// The underlying pool, for resource registration.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a transaction, checking a connection out of the pool.
    pub async fn begin(&self) -> PrimaryStoreResult<PrimaryTransaction> {
        Ok(PrimaryTransaction {
            inner: self.pool.begin().await?,
        })
    }

    // --- schema management ---

    /// Create the admin tables and their indexes if absent.
    pub async fn initialize_admin_schema(&self) -> PrimaryStoreResult<()> {
        for ddl in schema::admin_tables_sql() {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        for ddl in schema::admin_indexes_sql() {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        info!("Admin schema initialized");
        Ok(())
    }

    /// Create the per-space data tables.
    pub async fn create_space_tables(&self, space_id: &str) -> PrimaryStoreResult<()> {
        validate_space_id(space_id)?;
        for ddl in schema::space_tables_sql(space_id) {
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        info!(space_id, "Primary data tables created");
        Ok(())
    }

    /// Drop the per-space data tables. Idempotent.
    pub async fn drop_space_tables(&self, space_id: &str) -> PrimaryStoreResult<()> {
        validate_space_id(space_id)?;
        for ddl in schema::drop_space_tables_sql(space_id) {
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        info!(space_id, "Primary data tables dropped");
        Ok(())
    }

    /// Check whether a space's data tables exist.
    pub async fn space_tables_exist(&self, space_id: &str) -> PrimaryStoreResult<bool> {
        validate_space_id(space_id)?;
        let row = sqlx::query("SELECT to_regclass($1) IS NOT NULL AS present")
            .bind(format!("{space_id}_rdf_quad"))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<bool, _>("present")?)
    }

    // --- quad storage ---

    /// Store quads inside an open transaction.
    ///
    /// Terms are deduplicated by term identity (a literal `"1"^^xsd:int` is
    /// distinct from the IRI `<1>`), missing term rows are inserted in one
    /// batch, then all quad rows are batch-inserted.
    pub async fn store_quads(
        &self,
        space_id: &str,
        quads: &[Quad],
        tx: &mut PrimaryTransaction,
    ) -> PrimaryStoreResult<()> {
        validate_space_id(space_id)?;
        if quads.is_empty() {
            return Ok(());
        }
        let term_table = format!("{space_id}_term");
        let quad_table = format!("{space_id}_rdf_quad");

        // One pass to collect the distinct terms.
        let mut terms: HashMap<TermInfo, Uuid> = HashMap::new();
        for quad in quads {
            for info in quad_term_infos(quad) {
                let uuid = term_uuid(&info);
                terms.entry(info).or_insert(uuid);
            }
        }

        // Probe which UUIDs already exist with dataset='primary'.
        let all_uuids: Vec<Uuid> = terms.values().copied().collect();
        let mut existing: HashSet<Uuid> = HashSet::new();
        for chunk in all_uuids.chunks(BATCH_SIZE * 4) {
            let query = format!(
                "SELECT term_uuid FROM {term_table} WHERE term_uuid = ANY($1) AND dataset = 'primary'"
            );
            let rows = sqlx::query(&query)
                .bind(chunk)
                .fetch_all(&mut *tx.inner)
                .await?;
            for row in rows {
                existing.insert(row.try_get("term_uuid")?);
            }
        }

        let now = Utc::now().naive_utc();
        let new_terms: Vec<(&TermInfo, Uuid)> = terms
            .iter()
            .filter(|(_, uuid)| !existing.contains(uuid))
            .map(|(info, uuid)| (info, *uuid))
            .collect();
        debug!(
            space_id,
            total = terms.len(),
            new = new_terms.len(),
            "Term dedupe complete"
        );

        for chunk in new_terms.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {term_table} (term_uuid, term_text, term_type, lang, datatype_id, created_time) "
            ));
            builder.push_values(chunk, |mut b, (info, uuid)| {
                b.push_bind(*uuid)
                    .push_bind(info.text.clone())
                    .push_bind(info.kind.as_char().to_string())
                    .push_bind(info.lang.clone())
                    .push_bind(datatype_id(info))
                    .push_bind(now);
            });
            // Another transaction can race the existence probe.
            builder.push(" ON CONFLICT (term_uuid, dataset) DO NOTHING");
            builder.build().execute(&mut *tx.inner).await?;
        }

        // Quad rows reference the UUID map built above. The batch is
        // deduplicated against itself and against rows already present,
        // so re-applying the same insert is a no-op (quad_uuid would
        // otherwise mint a fresh row per attempt).
        let mut seen_rows = HashSet::new();
        let quad_rows: Vec<[Uuid; 4]> = quads
            .iter()
            .map(|quad| {
                let infos = quad_term_infos(quad);
                [
                    terms[&infos[0]],
                    terms[&infos[1]],
                    terms[&infos[2]],
                    terms[&infos[3]],
                ]
            })
            .filter(|row| seen_rows.insert(*row))
            .collect();

        let mut to_insert: Vec<[Uuid; 4]> = Vec::with_capacity(quad_rows.len());
        for chunk in quad_rows.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "SELECT subject_uuid, predicate_uuid, object_uuid, context_uuid FROM {quad_table} \
                 WHERE dataset = 'primary' AND (subject_uuid, predicate_uuid, object_uuid, context_uuid) IN "
            ));
            builder.push_tuples(chunk, |mut b, row| {
                b.push_bind(row[0])
                    .push_bind(row[1])
                    .push_bind(row[2])
                    .push_bind(row[3]);
            });
            let rows = builder.build().fetch_all(&mut *tx.inner).await?;
            let mut existing = HashSet::new();
            for row in rows {
                existing.insert([
                    row.try_get::<Uuid, _>("subject_uuid")?,
                    row.try_get::<Uuid, _>("predicate_uuid")?,
                    row.try_get::<Uuid, _>("object_uuid")?,
                    row.try_get::<Uuid, _>("context_uuid")?,
                ]);
            }
            to_insert.extend(chunk.iter().filter(|row| !existing.contains(*row)));
        }

        for chunk in to_insert.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {quad_table} (subject_uuid, predicate_uuid, object_uuid, context_uuid, created_time) "
            ));
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row[0])
                    .push_bind(row[1])
                    .push_bind(row[2])
                    .push_bind(row[3])
                    .push_bind(now);
            });
            builder.build().execute(&mut *tx.inner).await?;
        }

        debug!(
            space_id,
            quads = quads.len(),
            inserted = to_insert.len(),
            "Quads stored in primary"
        );
        Ok(())
    }

    /// Remove quads inside an open transaction.
    ///
    /// UUIDs are resolved by looking up the unwrapped term text, because
    /// callers may pass wire-formatted values that differ from the stored
    /// canonical form. Numeric literals that miss get one prefix-match
    /// retry with 1% tolerance, compensating for index float truncation;
    /// any term still unresolved fails the whole operation. Unless
    /// `skip_orphan_sweep` is set, every touched term that no quad still
    /// references is deleted afterwards.
    pub async fn remove_quads(
        &self,
        space_id: &str,
        quads: &[Quad],
        tx: &mut PrimaryTransaction,
        skip_orphan_sweep: bool,
    ) -> PrimaryStoreResult<()> {
        validate_space_id(space_id)?;
        if quads.is_empty() {
            return Ok(());
        }
        let term_table = format!("{space_id}_term");
        let quad_table = format!("{space_id}_rdf_quad");

        let mut unique_texts: HashSet<String> = HashSet::new();
        for quad in quads {
            for info in quad_term_infos(quad) {
                unique_texts.insert(info.text);
            }
        }
        let texts: Vec<String> = unique_texts.iter().cloned().collect();

        // Batch lookup by unwrapped text.
        let mut uuid_by_text: HashMap<String, Uuid> = HashMap::new();
        for chunk in texts.chunks(BATCH_SIZE * 4) {
            let query = format!(
                "SELECT term_text, term_uuid FROM {term_table} WHERE term_text = ANY($1) AND dataset = 'primary'"
            );
            let rows = sqlx::query(&query)
                .bind(chunk)
                .fetch_all(&mut *tx.inner)
                .await?;
            for row in rows {
                uuid_by_text.insert(row.try_get("term_text")?, row.try_get("term_uuid")?);
            }
        }

        // Prefix-match fallback for numeric literals the index truncated.
        let missing: Vec<String> = texts
            .iter()
            .filter(|t| !uuid_by_text.contains_key(*t))
            .cloned()
            .collect();
        for missing_text in &missing {
            let Some(pattern) = numeric_prefix_pattern(missing_text) else {
                continue;
            };
            let missing_value: f64 = missing_text.parse().unwrap_or(f64::NAN);
            let query = format!(
                "SELECT term_text, term_uuid FROM {term_table} WHERE term_text LIKE $1 AND dataset = 'primary'"
            );
            let rows = sqlx::query(&query)
                .bind(&pattern)
                .fetch_all(&mut *tx.inner)
                .await?;
            for row in rows {
                let candidate_text: String = row.try_get("term_text")?;
                if let Ok(candidate) = candidate_text.parse::<f64>() {
                    if within_one_percent(candidate, missing_value) {
                        info!(
                            wanted = %missing_text,
                            matched = %candidate_text,
                            "Recovered truncated numeric literal via prefix match"
                        );
                        uuid_by_text.insert(missing_text.clone(), row.try_get("term_uuid")?);
                        break;
                    }
                }
            }
        }

        let still_missing: Vec<&String> = texts
            .iter()
            .filter(|t| !uuid_by_text.contains_key(*t))
            .collect();
        if !still_missing.is_empty() {
            return Err(PrimaryStoreError::UnresolvedTerms {
                count: still_missing.len(),
                sample: still_missing[0].clone(),
            });
        }

        // Batch delete by the four resolved UUIDs.
        let quad_keys: Vec<[Uuid; 4]> = quads
            .iter()
            .map(|quad| {
                let infos = quad_term_infos(quad);
                [
                    uuid_by_text[&infos[0].text],
                    uuid_by_text[&infos[1].text],
                    uuid_by_text[&infos[2].text],
                    uuid_by_text[&infos[3].text],
                ]
            })
            .collect();

        for chunk in quad_keys.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "DELETE FROM {quad_table} WHERE dataset = 'primary' AND (subject_uuid, predicate_uuid, object_uuid, context_uuid) IN "
            ));
            builder.push_tuples(chunk, |mut b, row| {
                b.push_bind(row[0])
                    .push_bind(row[1])
                    .push_bind(row[2])
                    .push_bind(row[3]);
            });
            builder.build().execute(&mut *tx.inner).await?;
        }
        debug!(space_id, quads = quads.len(), "Quads removed from primary");

        if !skip_orphan_sweep {
            let touched: Vec<Uuid> = uuid_by_text.values().copied().collect();
            self.sweep_orphan_terms(space_id, &touched, tx).await?;
        }
        Ok(())
    }

    /// Delete term rows from the given set that no quad references.
    async fn sweep_orphan_terms(
        &self,
        space_id: &str,
        candidates: &[Uuid],
        tx: &mut PrimaryTransaction,
    ) -> PrimaryStoreResult<u64> {
        let term_table = format!("{space_id}_term");
        let quad_table = format!("{space_id}_rdf_quad");
        let mut removed = 0u64;
        for chunk in candidates.chunks(BATCH_SIZE * 4) {
            let query = format!(
                "DELETE FROM {term_table} t \
                 WHERE t.term_uuid = ANY($1) AND t.dataset = 'primary' \
                 AND NOT EXISTS (\
                    SELECT 1 FROM {quad_table} q WHERE q.dataset = 'primary' \
                    AND (q.subject_uuid = t.term_uuid OR q.predicate_uuid = t.term_uuid \
                         OR q.object_uuid = t.term_uuid OR q.context_uuid = t.term_uuid))"
            );
            let result = sqlx::query(&query)
                .bind(chunk)
                .execute(&mut *tx.inner)
                .await?;
            removed += result.rows_affected();
        }
        if removed > 0 {
            debug!(space_id, removed, "Orphan terms swept");
        }
        Ok(removed)
    }

    /// Delete every quad whose context is the given graph, then sweep all
    /// orphaned terms. Used by DROP/CLEAR GRAPH.
    pub async fn delete_graph_quads(
        &self,
        space_id: &str,
        graph_uri: &str,
        tx: &mut PrimaryTransaction,
    ) -> PrimaryStoreResult<u64> {
        validate_space_id(space_id)?;
        let term_table = format!("{space_id}_term");
        let quad_table = format!("{space_id}_rdf_quad");

        let query = format!(
            "DELETE FROM {quad_table} WHERE dataset = 'primary' AND context_uuid IN \
             (SELECT term_uuid FROM {term_table} WHERE term_text = $1 AND term_type = 'U' AND dataset = 'primary')"
        );
        let result = sqlx::query(&query)
            .bind(graph_uri)
            .execute(&mut *tx.inner)
            .await?;
        let removed = result.rows_affected();

        // A graph drop can orphan any term, so the sweep is table-wide.
        let sweep = format!(
            "DELETE FROM {term_table} t WHERE t.dataset = 'primary' \
             AND NOT EXISTS (\
                SELECT 1 FROM {quad_table} q WHERE q.dataset = 'primary' \
                AND (q.subject_uuid = t.term_uuid OR q.predicate_uuid = t.term_uuid \
                     OR q.object_uuid = t.term_uuid OR q.context_uuid = t.term_uuid))"
        );
        sqlx::query(&sweep).execute(&mut *tx.inner).await?;

        debug!(space_id, graph_uri, removed, "Graph quads removed from primary");
        Ok(removed)
    }

    /// Count a space's quads, optionally restricted to one graph.
    pub async fn count_quads(
        &self,
        space_id: &str,
        graph_uri: Option<&str>,
    ) -> PrimaryStoreResult<u64> {
        validate_space_id(space_id)?;
        let term_table = format!("{space_id}_term");
        let quad_table = format!("{space_id}_rdf_quad");
        let count: i64 = match graph_uri {
            Some(uri) => {
                let query = format!(
                    "SELECT COUNT(*) FROM {quad_table} WHERE dataset = 'primary' AND context_uuid IN \
                     (SELECT term_uuid FROM {term_table} WHERE term_text = $1 AND term_type = 'U' AND dataset = 'primary')"
                );
                sqlx::query_scalar(&query)
                    .bind(uri)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                let query =
                    format!("SELECT COUNT(*) FROM {quad_table} WHERE dataset = 'primary'");
                sqlx::query_scalar(&query).fetch_one(&self.pool).await?
            }
        };
        Ok(count as u64)
    }

    /// Page through a space's quads in readable form and log them.
    /// Gated by `database.enable_quad_logging`.
    pub async fn log_space_quads(&self, space_id: &str, page_size: i64) -> PrimaryStoreResult<()> {
        if !self.enable_quad_logging {
            return Ok(());
        }
        validate_space_id(space_id)?;
        let term_table = format!("{space_id}_term");
        let quad_table = format!("{space_id}_rdf_quad");
        let query = format!(
            "SELECT s.term_text AS s, p.term_text AS p, o.term_text AS o, c.term_text AS c \
             FROM {quad_table} q \
             JOIN {term_table} s ON s.term_uuid = q.subject_uuid AND s.dataset = q.dataset \
             JOIN {term_table} p ON p.term_uuid = q.predicate_uuid AND p.dataset = q.dataset \
             JOIN {term_table} o ON o.term_uuid = q.object_uuid AND o.dataset = q.dataset \
             JOIN {term_table} c ON c.term_uuid = q.context_uuid AND c.dataset = q.dataset \
             WHERE q.dataset = 'primary' ORDER BY q.created_time LIMIT $1 OFFSET $2"
        );
        let mut offset = 0i64;
        loop {
            let rows = sqlx::query(&query)
                .bind(page_size)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
            if rows.is_empty() {
                break;
            }
            for row in &rows {
                let (s, p, o, c): (String, String, String, String) = (
                    row.try_get("s")?,
                    row.try_get("p")?,
                    row.try_get("o")?,
                    row.try_get("c")?,
                );
                debug!(space_id, s = %s, p = %p, o = %o, c = %c, "quad");
            }
            offset += rows.len() as i64;
        }
        Ok(())
    }

    // --- admin registry ---

    /// Insert a space record; an existing record is left untouched.
    pub async fn create_space_record(
        &self,
        space_id: &str,
        space_name: &str,
        tenant: Option<&str>,
    ) -> PrimaryStoreResult<()> {
        validate_space_id(space_id)?;
        sqlx::query(
            "INSERT INTO space (space_id, space_name, tenant, update_time) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (space_id) DO NOTHING",
        )
        .bind(space_id)
        .bind(space_name)
        .bind(tenant)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a space record; graph rows cascade.
    pub async fn delete_space_record(&self, space_id: &str) -> PrimaryStoreResult<()> {
        sqlx::query("DELETE FROM space WHERE space_id = $1")
            .bind(space_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All registered space ids.
    pub async fn list_space_ids(&self) -> PrimaryStoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT space_id FROM space ORDER BY space_id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("space_id").map_err(Into::into))
            .collect()
    }

    /// Look up a graph registration.
    pub async fn get_graph(
        &self,
        space_id: &str,
        graph_uri: &str,
    ) -> PrimaryStoreResult<Option<GraphRecord>> {
        let row = sqlx::query(
            "SELECT graph_uri, graph_name FROM graph WHERE space_id = $1 AND graph_uri = $2",
        )
        .bind(space_id)
        .bind(graph_uri)
        .fetch_optional(&self.pool)
        .await?;
        Ok(match row {
            Some(row) => Some(GraphRecord {
                graph_uri: row.try_get("graph_uri")?,
                graph_name: row.try_get("graph_name")?,
            }),
            None => None,
        })
    }

    /// Register a graph. A concurrent registration by another instance
    /// surfaces as a unique violation and is treated as success.
    pub async fn register_graph(
        &self,
        space_id: &str,
        graph_uri: &str,
        graph_name: &str,
    ) -> PrimaryStoreResult<()> {
        let result = sqlx::query(
            "INSERT INTO graph (space_id, graph_uri, graph_name, created_time) VALUES ($1, $2, $3, $4)",
        )
        .bind(space_id)
        .bind(graph_uri)
        .bind(graph_name)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => {
                debug!(space_id, graph_uri, "Graph registered");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                debug!(space_id, graph_uri, "Graph already registered (race)");
                Ok(())
            }
            Err(e) => {
                warn!(space_id, graph_uri, error = %e, "Graph registration failed");
                Err(e.into())
            }
        }
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// The four term rows referenced by one quad, in s/p/o/c order.
fn quad_term_infos(quad: &Quad) -> [TermInfo; 4] {
    [
        TermInfo::from_object(&RdfObject::from(quad.subject.clone())),
        TermInfo::from_object(&RdfObject::NamedNode(quad.predicate.as_named_node().clone())),
        TermInfo::from_object(&quad.object),
        TermInfo::from_object(&RdfObject::NamedNode(quad.graph.clone())),
    ]
}
