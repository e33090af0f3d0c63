//! Per-bucket upload endpoint cache
//!
//! The store hands out (upload URL, upload token) pairs scoped to one
//! bucket. Acquisition goes through the auth session; results are cached
//! per bucket id and reused across successful uploads. The cache policy is
//! cache-until-failure: an endpoint is only dropped after a failed upload
//! that used it, because the store may issue single-use or short-lived
//! upload URLs. It is not proactively rotated between successful uploads;
//! a store that enforces strictly single-use URLs costs one failed request
//! per rotation under this policy.

use std::sync::Arc;

use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use stowage_core::{StowageError, StowageResult};

use crate::auth::SessionManager;

/// Bucket-scoped upload target issued by the store
#[derive(Debug, Clone, Deserialize)]
pub struct UploadEndpoint {
    /// Bucket this endpoint is scoped to
    #[serde(rename = "bucketId")]
    pub bucket_id: String,
    /// URL uploads must be POSTed to
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
    /// Bearer credential for the upload URL
    #[serde(rename = "authorizationToken")]
    pub upload_token: String,
}

type Slot = Arc<Mutex<Option<Arc<UploadEndpoint>>>>;

/// Cache of [`UploadEndpoint`]s keyed by bucket id.
///
/// First acquisition per bucket is single-flight: each bucket owns a slot
/// whose lock is held across the fetch, so concurrent cold callers for the
/// same bucket trigger one upload-URL request. Different buckets do not
/// contend.
#[derive(Debug)]
pub struct EndpointCache {
    http: Client,
    session: Arc<SessionManager>,
    slots: DashMap<String, Slot>,
}

impl EndpointCache {
    pub fn new(http: Client, session: Arc<SessionManager>) -> Self {
        Self {
            http,
            session,
            slots: DashMap::new(),
        }
    }

    /// Return the cached endpoint for `bucket_id`, fetching one if absent.
    pub async fn get(&self, bucket_id: &str) -> StowageResult<Arc<UploadEndpoint>> {
        let slot: Slot = {
            let entry = self.slots.entry(bucket_id.to_string()).or_default();
            Arc::clone(entry.value())
        };

        let mut guard = slot.lock().await;
        if let Some(endpoint) = guard.as_ref() {
            return Ok(Arc::clone(endpoint));
        }

        let endpoint = Arc::new(self.fetch(bucket_id).await?);
        *guard = Some(Arc::clone(&endpoint));
        Ok(endpoint)
    }

    /// Remove the cached endpoint for one bucket. Idempotent; the next
    /// `get` for that bucket refetches. No lock is held across the refetch,
    /// so a brief stampede after invalidation is possible and bounded by
    /// request latency.
    pub async fn invalidate(&self, bucket_id: &str) {
        let slot = self
            .slots
            .get(bucket_id)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(slot) = slot {
            if slot.lock().await.take().is_some() {
                debug!(bucket_id, "upload endpoint invalidated");
            }
        }
    }

    async fn fetch(&self, bucket_id: &str) -> StowageResult<UploadEndpoint> {
        let session = self.session.acquire().await?;
        let url = format!(
            "{}/api/v1/get_upload_url",
            session.api_base_url.trim_end_matches('/')
        );

        debug!(bucket_id, "requesting fresh upload endpoint");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&session.bearer_token)
            .json(&serde_json::json!({ "bucketId": bucket_id }))
            .send()
            .await
            .map_err(|e| StowageError::endpoint(bucket_id, "upload URL request failed", e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // The session the request used is dead; next caller re-authenticates
            self.session.invalidate().await;
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StowageError::EndpointAcquisition {
                bucket_id: bucket_id.to_string(),
                message: format!("store returned status {}: {}", status.as_u16(), body),
                source: None,
            });
        }

        response
            .json::<UploadEndpoint>()
            .await
            .map_err(|e| StowageError::endpoint(bucket_id, "malformed upload URL response", e))
    }
}
