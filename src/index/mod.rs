//! Async HTTP client for the SPARQL index (Fuseki).
//!
//! Every outbound request to the index goes through this client: dataset
//! administration, INSERT/DELETE DATA, arbitrary UPDATE, and the three
//! query forms. Transient failures are retried with exponential backoff
//! and jitter; auth headers are recomputed on every attempt so a refreshed
//! bearer token is always used.

pub mod auth;

use crate::config::FusekiConfig;
use crate::rdf::vocab::MATERIALIZED_PREDICATES;
use crate::rdf::{
    wire, BlankNode, Literal, NamedNode, Quad, RdfObject, RdfPredicate, RdfSubject, Triple,
};
use auth::KeycloakAuth;
use rand::Rng;
use rio_api::parser::TriplesParser;
use rio_turtle::NTriplesParser;
use sparesults::{QueryResultsFormat, QueryResultsParser, ReaderQueryResultsParserOutput};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Index client errors
#[derive(Error, Debug)]
pub enum IndexError {
    /// The index answered with a non-success status
    #[error("Index returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Transport-level failure (after retries were exhausted)
    #[error("Index transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Bearer-token acquisition failed
    #[error("Index authentication failed: {0}")]
    Auth(String),

    /// The index answered with a body this client cannot interpret
    #[error("Cannot parse index response: {0}")]
    Response(String),
}

impl From<rio_turtle::TurtleError> for IndexError {
    fn from(e: rio_turtle::TurtleError) -> Self {
        IndexError::Response(format!("invalid N-Triples response: {e}"))
    }
}

pub type IndexResult<T> = Result<T, IndexError>;

/// One row of a SELECT result: variable name to bound term.
pub type SelectBinding = HashMap<String, RdfObject>;

/// Outcome of the startup dataset sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistrationStats {
    pub registered: usize,
    pub already_existed: usize,
    pub failed: usize,
}

enum AuthMode {
    Basic { username: String, password: String },
    Bearer(KeycloakAuth),
}

/// Maximum retry attempts beyond the initial request.
const MAX_RETRIES: u32 = 5;
/// Base delay for exponential backoff.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
/// Keepalive must stay below the load balancer's 60s idle timeout.
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 502 | 503 | 504)
}

fn is_retryable_transport(error: &reqwest::Error) -> bool {
    // Connection refused/reset, read timeout, and mid-response disconnects
    // all surface as send-phase errors; only request construction and body
    // decoding failures are deterministic.
    !error.is_builder() && !error.is_decode()
}

fn backoff_delay(attempt: u32) -> Duration {
    let base = RETRY_BASE_DELAY.as_secs_f64() * f64::from(1u32 << attempt.min(16));
    let jitter = rand::thread_rng().gen_range(0.0..0.5);
    Duration::from_secs_f64(base + jitter)
}

/// Async client for the SPARQL-over-HTTP index.
pub struct IndexClient {
    http: reqwest::Client,
    server_url: String,
    auth: AuthMode,
    auto_register_datasets: bool,
}

impl IndexClient {
    /// Build a client from index configuration.
    pub fn new(config: &FusekiConfig) -> IndexResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(config.connection_limit)
            .build()?;

        let auth = if config.enable_authentication {
            let keycloak = config.keycloak.clone().ok_or_else(|| {
                IndexError::Auth("enable_authentication is set but no keycloak block given".into())
            })?;
            info!("Index client using bearer authentication via Keycloak");
            AuthMode::Bearer(KeycloakAuth::new(keycloak))
        } else {
            AuthMode::Basic {
                username: config.username.clone(),
                password: config.password.clone(),
            }
        };

        Ok(Self {
            http,
            server_url: config.server_url.trim_end_matches('/').to_string(),
            auth,
            auto_register_datasets: config.auto_register_datasets,
        })
    }

    /// Index dataset name for a space.
    pub fn dataset_name(space_id: &str) -> String {
        format!("vitalgraph_space_{space_id}")
    }

    async fn apply_auth(
        &self,
        req: reqwest::RequestBuilder,
    ) -> IndexResult<reqwest::RequestBuilder> {
        match &self.auth {
            AuthMode::Basic { username, password } => Ok(req.basic_auth(username, Some(password))),
            AuthMode::Bearer(keycloak) => {
                let token = keycloak.bearer_token(&self.http).await?;
                Ok(req.bearer_auth(token))
            }
        }
    }

    /// Send a request, retrying transient failures with backoff + jitter.
    ///
    /// Auth headers are rebuilt on every attempt; a 401 forces a token
    /// refresh before the next try.
    async fn send_with_retry<F>(&self, make: F) -> IndexResult<reqwest::Response>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            let req = self.apply_auth(make(&self.http)).await?;
            match req.send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if status == 401 && attempt < MAX_RETRIES {
                        warn!(attempt, "Index returned 401, refreshing credentials and retrying");
                        if let AuthMode::Bearer(keycloak) = &self.auth {
                            keycloak.force_refresh(&self.http).await?;
                        }
                        tokio::time::sleep(backoff_delay(0)).await;
                        attempt += 1;
                        continue;
                    }
                    if is_retryable_status(status) && attempt < MAX_RETRIES {
                        let delay = backoff_delay(attempt);
                        warn!(
                            status,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "Index returned transient status, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    if is_retryable_status(status) || status == 401 {
                        error!(status, "Index still failing after {} attempts", attempt + 1);
                    }
                    return Ok(resp);
                }
                Err(e) if is_retryable_transport(&e) && attempt < MAX_RETRIES => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Index transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn expect_success(resp: reqwest::Response) -> IndexResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(IndexError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Liveness check against the admin ping endpoint.
    pub async fn ping(&self) -> IndexResult<()> {
        let url = format!("{}/$/ping", self.server_url);
        let resp = self.send_with_retry(|c| c.get(&url)).await?;
        Self::expect_success(resp).await?;
        Ok(())
    }

    /// Create the index dataset for a space. An existing dataset (409) is
    /// treated as success.
    pub async fn create_dataset(&self, space_id: &str) -> IndexResult<()> {
        let name = Self::dataset_name(space_id);
        let url = format!("{}/$/datasets", self.server_url);
        let resp = self
            .send_with_retry(|c| {
                c.post(&url)
                    .query(&[("dbName", name.as_str()), ("dbType", "tdb2")])
            })
            .await?;
        match resp.status().as_u16() {
            200 | 201 => {
                debug!(dataset = %name, "Index dataset created");
                Ok(())
            }
            409 => {
                debug!(dataset = %name, "Index dataset already exists");
                Ok(())
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(IndexError::Http { status, body })
            }
        }
    }

    /// Delete the index dataset for a space. A missing dataset (404) is
    /// treated as success so deletion stays idempotent.
    pub async fn delete_dataset(&self, space_id: &str) -> IndexResult<()> {
        let name = Self::dataset_name(space_id);
        let url = format!("{}/$/datasets/{}", self.server_url, name);
        let resp = self.send_with_retry(|c| c.delete(&url)).await?;
        match resp.status().as_u16() {
            200 | 204 => {
                debug!(dataset = %name, "Index dataset deleted");
                Ok(())
            }
            404 => {
                debug!(dataset = %name, "Index dataset already absent");
                Ok(())
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(IndexError::Http { status, body })
            }
        }
    }

    /// List dataset names currently registered on the index.
    pub async fn list_datasets(&self) -> IndexResult<Vec<String>> {
        let url = format!("{}/$/datasets", self.server_url);
        let resp = self.send_with_retry(|c| c.get(&url)).await?;
        let resp = Self::expect_success(resp).await?;
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IndexError::Response(format!("dataset list: {e}")))?;
        let mut names = Vec::new();
        if let Some(datasets) = body.get("datasets").and_then(|d| d.as_array()) {
            for ds in datasets {
                if let Some(name) = ds.get("ds.name").and_then(|n| n.as_str()) {
                    names.push(name.trim_start_matches('/').to_string());
                }
            }
        }
        Ok(names)
    }

    /// Check whether a space's dataset is registered on the index.
    pub async fn dataset_exists(&self, space_id: &str) -> IndexResult<bool> {
        let name = Self::dataset_name(space_id);
        Ok(self.list_datasets().await?.contains(&name))
    }

    /// Startup sweep: create any missing dataset for the known spaces,
    /// one at a time, tolerating 409 races with other instances.
    pub async fn ensure_datasets_registered(
        &self,
        space_ids: &[String],
    ) -> IndexResult<RegistrationStats> {
        let mut stats = RegistrationStats::default();
        if !self.auto_register_datasets {
            info!("Index dataset auto-registration disabled by config");
            return Ok(stats);
        }

        let existing = self.list_datasets().await.unwrap_or_else(|e| {
            warn!(error = %e, "Could not list index datasets, assuming none");
            Vec::new()
        });

        for space_id in space_ids {
            let name = Self::dataset_name(space_id);
            if existing.contains(&name) {
                stats.already_existed += 1;
                continue;
            }
            match self.create_dataset(space_id).await {
                Ok(()) => {
                    info!(dataset = %name, "Registered missing index dataset");
                    stats.registered += 1;
                }
                Err(e) => {
                    error!(dataset = %name, error = %e, "Failed to register index dataset");
                    stats.failed += 1;
                }
            }
        }
        info!(
            registered = stats.registered,
            already_existed = stats.already_existed,
            failed = stats.failed,
            "Index dataset registration sweep complete"
        );
        Ok(stats)
    }

    /// Execute a SPARQL UPDATE against a space's dataset.
    pub async fn update(&self, space_id: &str, sparql_update: &str) -> IndexResult<()> {
        let url = format!(
            "{}/{}/update",
            self.server_url,
            Self::dataset_name(space_id)
        );
        let body = sparql_update.to_string();
        let resp = self
            .send_with_retry(move |c| {
                c.post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "application/sparql-update")
                    .body(body.clone())
            })
            .await?;
        Self::expect_success(resp).await?;
        debug!(space_id, "Index SPARQL UPDATE applied");
        Ok(())
    }

    /// Insert quads as a single `INSERT DATA`, grouped by graph.
    ///
    /// `float_to_decimal` promotes `xsd:float` literals to `xsd:decimal`
    /// so the index does not round their decimal expansions.
    pub async fn insert_data(
        &self,
        space_id: &str,
        quads: &[Quad],
        float_to_decimal: bool,
    ) -> IndexResult<()> {
        if quads.is_empty() {
            return Ok(());
        }
        self.update(space_id, &wire::insert_data_update(quads, float_to_decimal))
            .await
    }

    /// Delete quads as a single `DELETE DATA`, grouped by graph.
    pub async fn delete_data(&self, space_id: &str, quads: &[Quad]) -> IndexResult<()> {
        if quads.is_empty() {
            return Ok(());
        }
        self.update(space_id, &wire::delete_data_update(quads)).await
    }

    async fn query_raw(
        &self,
        space_id: &str,
        sparql: &str,
        accept: &'static str,
    ) -> IndexResult<reqwest::Response> {
        let url = format!(
            "{}/{}/sparql",
            self.server_url,
            Self::dataset_name(space_id)
        );
        let body = sparql.to_string();
        let resp = self
            .send_with_retry(move |c| {
                c.post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "application/sparql-query")
                    .header(reqwest::header::ACCEPT, accept)
                    .body(body.clone())
            })
            .await?;
        Self::expect_success(resp).await
    }

    /// Execute a SELECT and return its bindings.
    pub async fn select(&self, space_id: &str, sparql: &str) -> IndexResult<Vec<SelectBinding>> {
        let resp = self
            .query_raw(space_id, sparql, "application/sparql-results+json")
            .await?;
        let bytes = resp.bytes().await?;
        let parser = QueryResultsParser::from_format(QueryResultsFormat::Json);
        match parser
            .for_reader(bytes.as_ref())
            .map_err(|e| IndexError::Response(format!("SELECT results: {e}")))?
        {
            ReaderQueryResultsParserOutput::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution =
                        solution.map_err(|e| IndexError::Response(format!("SELECT row: {e}")))?;
                    let mut row = SelectBinding::new();
                    for (variable, term) in solution.iter() {
                        row.insert(variable.as_str().to_string(), term.clone().into());
                    }
                    rows.push(row);
                }
                Ok(rows)
            }
            ReaderQueryResultsParserOutput::Boolean(_) => Err(IndexError::Response(
                "expected solutions, index answered a boolean".into(),
            )),
        }
    }

    /// Execute an ASK and return its boolean.
    pub async fn ask(&self, space_id: &str, sparql: &str) -> IndexResult<bool> {
        let resp = self
            .query_raw(space_id, sparql, "application/sparql-results+json")
            .await?;
        let bytes = resp.bytes().await?;
        let parser = QueryResultsParser::from_format(QueryResultsFormat::Json);
        match parser
            .for_reader(bytes.as_ref())
            .map_err(|e| IndexError::Response(format!("ASK results: {e}")))?
        {
            ReaderQueryResultsParserOutput::Boolean(value) => Ok(value),
            ReaderQueryResultsParserOutput::Solutions(_) => Err(IndexError::Response(
                "expected a boolean, index answered solutions".into(),
            )),
        }
    }

    /// Execute a CONSTRUCT and return the built triples.
    pub async fn construct(&self, space_id: &str, sparql: &str) -> IndexResult<Vec<Triple>> {
        let resp = self
            .query_raw(space_id, sparql, "application/n-triples")
            .await?;
        let text = resp.text().await?;
        let mut triples = Vec::new();
        let mut parser = NTriplesParser::new(text.as_bytes());
        parser.parse_all(&mut |t| -> Result<(), IndexError> {
            triples.push(convert_rio_triple(&t)?);
            Ok(())
        })?;
        Ok(triples)
    }

    /// Count quads in a space, optionally limited to one graph.
    ///
    /// The graph IRI is caller-supplied and spliced into the query, so it
    /// is RFC 3986-validated first.
    pub async fn count(&self, space_id: &str, graph: Option<&str>) -> IndexResult<u64> {
        let sparql = match graph {
            Some(g) => {
                oxiri::Iri::parse(g)
                    .map_err(|e| IndexError::Response(format!("invalid graph IRI {g}: {e}")))?;
                format!("SELECT (COUNT(*) AS ?count) WHERE {{ GRAPH <{g}> {{ ?s ?p ?o }} }}")
            }
            None => "SELECT (COUNT(*) AS ?count) WHERE { GRAPH ?g { ?s ?p ?o } }".to_string(),
        };
        self.count_query(space_id, &sparql).await
    }

    /// Count shortcut triples (`vg-direct:*` predicates) in a space.
    pub async fn count_materialized(&self, space_id: &str) -> IndexResult<u64> {
        let predicates = MATERIALIZED_PREDICATES
            .iter()
            .map(|p| format!("<{p}>"))
            .collect::<Vec<_>>()
            .join(", ");
        let sparql = format!(
            "SELECT (COUNT(*) AS ?count) WHERE {{ GRAPH ?g {{ ?s ?p ?o }} FILTER(?p IN ({predicates})) }}"
        );
        self.count_query(space_id, &sparql).await
    }

    async fn count_query(&self, space_id: &str, sparql: &str) -> IndexResult<u64> {
        let rows = self.select(space_id, sparql).await?;
        let row = rows
            .first()
            .ok_or_else(|| IndexError::Response("count query returned no rows".into()))?;
        let value = row
            .get("count")
            .ok_or_else(|| IndexError::Response("count query returned no ?count".into()))?;
        value
            .value()
            .parse::<u64>()
            .map_err(|e| IndexError::Response(format!("count is not an integer: {e}")))
    }
}

fn convert_rio_triple(triple: &rio_api::model::Triple<'_>) -> IndexResult<Triple> {
    use rio_api::model::{Literal as RioLiteral, Subject, Term};

    let subject: RdfSubject = match triple.subject {
        Subject::NamedNode(n) => NamedNode::new(n.iri)
            .map_err(|e| IndexError::Response(e.to_string()))?
            .into(),
        Subject::BlankNode(b) => BlankNode::from_identifier(b.id)
            .map_err(|e| IndexError::Response(e.to_string()))?
            .into(),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(IndexError::Response(
                "RDF-star subjects not supported".into(),
            ))
        }
    };

    let predicate =
        RdfPredicate::new(triple.predicate.iri).map_err(|e| IndexError::Response(e.to_string()))?;

    let object: RdfObject = match triple.object {
        Term::NamedNode(n) => NamedNode::new(n.iri)
            .map_err(|e| IndexError::Response(e.to_string()))?
            .into(),
        Term::BlankNode(b) => BlankNode::from_identifier(b.id)
            .map_err(|e| IndexError::Response(e.to_string()))?
            .into(),
        Term::Literal(RioLiteral::Simple { value }) => Literal::new_simple_literal(value).into(),
        Term::Literal(RioLiteral::LanguageTaggedString { value, language }) => {
            Literal::new_language_tagged_literal(value, language)
                .map_err(|e| IndexError::Response(e.to_string()))?
                .into()
        }
        Term::Literal(RioLiteral::Typed { value, datatype }) => Literal::new_typed_literal(
            value,
            NamedNode::new(datatype.iri).map_err(|e| IndexError::Response(e.to_string()))?,
        )
        .into(),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(IndexError::Response(
                "RDF-star objects not supported".into(),
            ))
        }
    };

    Ok(Triple::new(subject, predicate, object))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_name() {
        assert_eq!(IndexClient::dataset_name("s1"), "vitalgraph_space_s1");
    }

    #[test]
    fn test_retryable_status() {
        assert!(is_retryable_status(502));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(504));
        assert!(!is_retryable_status(500));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(200));
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let d0 = backoff_delay(0);
        let d3 = backoff_delay(3);
        assert!(d0 >= Duration::from_millis(500));
        assert!(d0 < Duration::from_millis(1001));
        assert!(d3 >= Duration::from_secs(4));
        assert!(d3 < Duration::from_millis(4501));
    }

    #[test]
    fn test_client_requires_keycloak_when_auth_enabled() {
        let config = FusekiConfig {
            enable_authentication: true,
            ..FusekiConfig::default()
        };
        assert!(IndexClient::new(&config).is_err());
    }

    #[test]
    fn test_basic_client_builds() {
        let config = FusekiConfig::default();
        assert!(IndexClient::new(&config).is_ok());
    }
}
