//! Account-level authentication and session caching
//!
//! The store's token carries no client-visible expiry, so the session is
//! treated as valid indefinitely: it is acquired lazily on the first
//! operation that needs it and discarded only when a request using it
//! fails with an authorization error. Refresh is lazy, never proactive.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use stowage_core::{Credentials, StowageError, StowageResult};

/// Session state returned by the authorization exchange
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    /// Store-side account id
    #[serde(rename = "accountId")]
    pub account_id: String,
    /// Bearer token for API and download calls
    #[serde(rename = "authorizationToken")]
    pub bearer_token: String,
    /// Base URL for API calls, assigned at authentication time
    #[serde(rename = "apiUrl")]
    pub api_base_url: String,
    /// Base URL for downloads, assigned at authentication time
    #[serde(rename = "downloadUrl")]
    pub download_base_url: String,
}

/// Lazily acquires and caches one [`AuthSession`] per client instance.
///
/// Concurrent callers needing auth share the in-flight acquisition: the
/// cache slot's lock is held across the exchange, so K cold callers
/// produce exactly one authorization HTTP call.
#[derive(Debug)]
pub struct SessionManager {
    http: Client,
    credentials: Credentials,
    auth_url: String,
    slot: Mutex<Option<Arc<AuthSession>>>,
}

impl SessionManager {
    pub fn new(http: Client, credentials: Credentials, auth_base_url: &str) -> Self {
        Self {
            http,
            credentials,
            auth_url: format!(
                "{}/api/v1/authorize",
                auth_base_url.trim_end_matches('/')
            ),
            slot: Mutex::new(None),
        }
    }

    /// Return the cached session, or perform the credential exchange and
    /// cache the result.
    ///
    /// Never retries; an authorization failure surfaces immediately and
    /// retry policy stays with the caller.
    pub async fn acquire(&self) -> StowageResult<Arc<AuthSession>> {
        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }

        let session = Arc::new(self.authenticate().await?);
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Drop the cached session so the next operation re-authenticates.
    /// Idempotent.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        if slot.take().is_some() {
            debug!("auth session invalidated");
        }
    }

    async fn authenticate(&self) -> StowageResult<AuthSession> {
        debug!(url = %self.auth_url, "authenticating against the store");

        let response = self
            .http
            .get(&self.auth_url)
            .basic_auth(&self.credentials.key_id, Some(&self.credentials.key))
            .send()
            .await
            .map_err(|e| StowageError::authentication("authorization request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StowageError::Authentication {
                message: format!("store returned status {}: {}", status.as_u16(), body),
                source: None,
            });
        }

        let session = response
            .json::<AuthSession>()
            .await
            .map_err(|e| StowageError::authentication("malformed authorization response", e))?;

        debug!(account_id = %session.account_id, "auth session acquired");
        Ok(session)
    }
}
