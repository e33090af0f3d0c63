//! Store client facade
//!
//! Owns the pooled HTTP client and every piece of mutable state (auth
//! session, per-bucket endpoint cache) so independently configured clients
//! can coexist in one process without cross-talk.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use url::Url;

use stowage_archive::Entry;
use stowage_core::{FileRecord, StowageError, StowageResult};

use crate::auth::SessionManager;
use crate::batch::{BatchItem, BatchUploader};
use crate::config::ClientConfig;
use crate::download::{DownloadOptions, DownloadPipeline, DownloadedFile};
use crate::endpoint::EndpointCache;
use crate::upload::{UploadOptions, UploadPipeline};

/// Custom-info key marking an uploaded blob as an encoded archive
pub const ARCHIVE_MARKER_KEY: &str = "archive";

/// Custom-info key carrying the original file count of an archive
pub const ARCHIVE_COUNT_KEY: &str = "archive_file_count";

/// One page of a file-name listing
#[derive(Debug, Clone, Deserialize)]
pub struct FileNamePage {
    /// Records in this page, in store order
    pub files: Vec<FileRecord>,
    /// Pass as `start_file_name` to fetch the next page; `None` on the last
    #[serde(rename = "nextFileName", default)]
    pub next_file_name: Option<String>,
}

/// High-level client for one bucket of the store.
///
/// All operations are async and fail fast with typed errors; retry policy
/// belongs to the caller.
#[derive(Debug)]
pub struct StoreClient {
    config: ClientConfig,
    http: Client,
    session: Arc<SessionManager>,
    uploads: Arc<UploadPipeline>,
    downloads: DownloadPipeline,
}

impl StoreClient {
    /// Build a client from plain configuration values.
    pub fn new(config: ClientConfig) -> StowageResult<Self> {
        Url::parse(&config.auth_base_url).map_err(|e| StowageError::Config {
            message: format!("invalid auth base URL '{}': {}", config.auth_base_url, e),
        })?;
        if config.bucket_id.is_empty() || config.bucket_name.is_empty() {
            return Err(StowageError::Config {
                message: "bucket id and bucket name must be non-empty".to_string(),
            });
        }

        let http = ClientBuilder::new()
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(concat!("stowage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StowageError::Config {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        let session = Arc::new(SessionManager::new(
            http.clone(),
            config.credentials.clone(),
            &config.auth_base_url,
        ));
        let endpoints = Arc::new(EndpointCache::new(http.clone(), Arc::clone(&session)));
        let uploads = Arc::new(UploadPipeline::new(
            http.clone(),
            endpoints,
            config.bucket_id.clone(),
        ));
        let downloads = DownloadPipeline::new(
            http.clone(),
            Arc::clone(&session),
            config.bucket_name.clone(),
        );

        Ok(Self {
            config,
            http,
            session,
            uploads,
            downloads,
        })
    }

    /// Upload one named payload.
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> StowageResult<FileRecord> {
        self.uploads.upload(file_name, bytes, options).await
    }

    /// Upload a list of payloads with at most `concurrency` in flight,
    /// returning records in input order. Fail-fast, no rollback.
    pub async fn upload_many(
        &self,
        files: Vec<BatchItem>,
        concurrency: usize,
    ) -> StowageResult<Vec<FileRecord>> {
        BatchUploader::new(Arc::clone(&self.uploads))
            .upload_many(files, concurrency)
            .await
    }

    /// Bundle named payloads into one archive blob and upload it, marking
    /// the record with `archive=true` and the original file count.
    pub async fn upload_archive(
        &self,
        file_name: &str,
        entries: &[Entry],
        options: UploadOptions,
    ) -> StowageResult<FileRecord> {
        let blob = stowage_archive::encode(entries)?;
        let options = options
            .with_info(ARCHIVE_MARKER_KEY, "true")
            .with_info(ARCHIVE_COUNT_KEY, entries.len().to_string());
        self.uploads.upload(file_name, blob, options).await
    }

    /// Download one payload by name.
    pub async fn download_by_name(
        &self,
        file_name: &str,
        options: &DownloadOptions,
    ) -> StowageResult<DownloadedFile> {
        self.downloads.download_by_name(file_name, options).await
    }

    /// Download one payload by store-assigned id.
    pub async fn download_by_id(
        &self,
        file_id: &str,
        options: &DownloadOptions,
    ) -> StowageResult<DownloadedFile> {
        self.downloads.download_by_id(file_id, options).await
    }

    /// Download an archive blob by name and unbundle it back into its
    /// named payloads.
    pub async fn download_archive(
        &self,
        file_name: &str,
        options: &DownloadOptions,
    ) -> StowageResult<Vec<Entry>> {
        let file = self.downloads.download_by_name(file_name, options).await?;
        stowage_archive::decode(&file.bytes)
    }

    /// Fetch one page of file names in the configured bucket, starting at
    /// `start_file_name` when paginating.
    pub async fn list_file_names(
        &self,
        start_file_name: Option<&str>,
        max_file_count: Option<u32>,
    ) -> StowageResult<FileNamePage> {
        let session = self.session.acquire().await?;
        let url = format!(
            "{}/api/v1/list_file_names",
            session.api_base_url.trim_end_matches('/')
        );

        let mut body = serde_json::json!({ "bucketId": self.config.bucket_id });
        if let Some(start) = start_file_name {
            body["startFileName"] = start.into();
        }
        if let Some(max) = max_file_count {
            body["maxFileCount"] = max.into();
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(&session.bearer_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| api_transport_error("list_file_names", e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.session.invalidate().await;
        }
        if !status.is_success() {
            return Err(api_status_error("list_file_names", status, response).await);
        }

        response
            .json::<FileNamePage>()
            .await
            .map_err(|e| StowageError::Api {
                operation: "list_file_names".to_string(),
                status: None,
                message: format!("malformed response: {}", e),
            })
    }

    /// Delete one file version by name and id.
    pub async fn delete_file_version(
        &self,
        file_name: &str,
        file_id: &str,
    ) -> StowageResult<()> {
        let session = self.session.acquire().await?;
        let url = format!(
            "{}/api/v1/delete_file_version",
            session.api_base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&session.bearer_token)
            .json(&serde_json::json!({
                "fileName": file_name,
                "fileId": file_id,
            }))
            .send()
            .await
            .map_err(|e| api_transport_error("delete_file_version", e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StowageError::NotFound {
                target: file_name.to_string(),
            });
        }
        if status == StatusCode::UNAUTHORIZED {
            self.session.invalidate().await;
        }
        if !status.is_success() {
            return Err(api_status_error("delete_file_version", status, response).await);
        }
        Ok(())
    }
}

fn api_transport_error(operation: &str, error: reqwest::Error) -> StowageError {
    StowageError::Api {
        operation: operation.to_string(),
        status: None,
        message: format!("request failed: {}", error),
    }
}

async fn api_status_error(
    operation: &str,
    status: StatusCode,
    response: reqwest::Response,
) -> StowageError {
    let body = response.text().await.unwrap_or_default();
    StowageError::Api {
        operation: operation.to_string(),
        status: Some(status.as_u16()),
        message: body,
    }
}

#[cfg(test)]
mod tests;
