//! Keycloak bearer-token management for authenticated index connections.

use super::{IndexError, IndexResult};
use crate::config::KeycloakConfig;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Refresh when within this margin of token expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct TokenState {
    access_token: Option<String>,
    token_type: String,
    expires_at: Instant,
}

/// Fetches and caches JWT access tokens via the Keycloak password grant.
///
/// Tokens are refreshed when within 60 seconds of expiry; a 401 from the
/// index forces an immediate refresh through [`KeycloakAuth::force_refresh`].
pub struct KeycloakAuth {
    config: KeycloakConfig,
    state: Mutex<TokenState>,
}

impl KeycloakAuth {
    pub fn new(config: KeycloakConfig) -> Self {
        Self {
            config,
            state: Mutex::new(TokenState {
                access_token: None,
                token_type: "Bearer".to_string(),
                expires_at: Instant::now(),
            }),
        }
    }

    /// Get a valid access token, refreshing if the cached one is stale.
    pub async fn bearer_token(&self, http: &Client) -> IndexResult<String> {
        let mut state = self.state.lock().await;
        if let Some(token) = &state.access_token {
            if Instant::now() + EXPIRY_MARGIN < state.expires_at {
                return Ok(token.clone());
            }
        }
        self.obtain(http, &mut state).await
    }

    /// Discard the cached token and fetch a fresh one.
    pub async fn force_refresh(&self, http: &Client) -> IndexResult<String> {
        let mut state = self.state.lock().await;
        state.access_token = None;
        self.obtain(http, &mut state).await
    }

    async fn obtain(&self, http: &Client, state: &mut TokenState) -> IndexResult<String> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            #[serde(default)]
            token_type: Option<String>,
            #[serde(default = "default_expires_in")]
            expires_in: u64,
        }

        fn default_expires_in() -> u64 {
            300
        }

        let token_url = format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.config.url.trim_end_matches('/'),
            self.config.realm
        );

        let mut form = vec![
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let resp = http
            .post(&token_url)
            .form(&form)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(status, "Keycloak token request failed");
            return Err(IndexError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| IndexError::Auth(format!("cannot parse token response: {e}")))?;

        state.token_type = token.token_type.unwrap_or_else(|| "Bearer".to_string());
        state.expires_at = Instant::now() + Duration::from_secs(token.expires_in);
        state.access_token = Some(token.access_token.clone());
        info!(expires_in = token.expires_in, "Obtained JWT token from Keycloak");
        Ok(token.access_token)
    }
}
