//! Download pipeline
//!
//! Fetches stored bytes by name or by store-assigned id, with optional
//! byte-range requests and fractional progress reporting as the body
//! streams in. Absence (404) is reported as a distinct `NotFound` error so
//! callers can treat "missing" differently from transient failure.

use std::sync::Arc;

use futures::StreamExt;
use percent_encoding::percent_decode_str;
use reqwest::header::{CONTENT_TYPE, RANGE};
use reqwest::{Client, StatusCode};
use tracing::debug;

use stowage_core::{StowageError, StowageResult};

use crate::auth::{AuthSession, SessionManager};
use crate::upload::{encode_file_name, DEFAULT_CONTENT_TYPE, FILE_NAME_HEADER};
use crate::ProgressCallback;

// Content-Length is server-supplied, so it is only a sizing hint; the
// buffer still grows to whatever actually arrives.
const MAX_PREALLOCATION: u64 = 4 * 1024 * 1024;

fn initial_capacity(declared_length: Option<u64>) -> usize {
    declared_length.unwrap_or(0).min(MAX_PREALLOCATION) as usize
}

/// Per-download options
#[derive(Clone, Default)]
pub struct DownloadOptions {
    /// Inclusive byte range to request instead of the whole payload
    pub range: Option<(u64, u64)>,
    /// Fractional progress reports while the body streams in; only emitted
    /// mid-flight when the response declares its length
    pub on_progress: Option<ProgressCallback>,
}

impl DownloadOptions {
    pub fn with_range(mut self, start: u64, end: u64) -> Self {
        self.range = Some((start, end));
        self
    }
}

/// Downloaded bytes plus the metadata recovered from response headers
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub content_length: u64,
    /// For id-based downloads this comes from the response headers, since
    /// the caller may not know the name in advance
    pub file_name: String,
}

/// Fetches payloads from the store's download base URL
#[derive(Debug)]
pub struct DownloadPipeline {
    http: Client,
    session: Arc<SessionManager>,
    bucket_name: String,
}

impl DownloadPipeline {
    pub fn new(http: Client, session: Arc<SessionManager>, bucket_name: impl Into<String>) -> Self {
        Self {
            http,
            session,
            bucket_name: bucket_name.into(),
        }
    }

    /// Download a file by its stored name.
    pub async fn download_by_name(
        &self,
        file_name: &str,
        options: &DownloadOptions,
    ) -> StowageResult<DownloadedFile> {
        let session = self.session.acquire().await?;
        let url = format!(
            "{}/file/{}/{}",
            session.download_base_url.trim_end_matches('/'),
            self.bucket_name,
            encode_file_name(file_name)
        );
        self.fetch(&session, url, file_name, Some(file_name), options)
            .await
    }

    /// Download a file by its store-assigned id. The file name is recovered
    /// from the response headers.
    pub async fn download_by_id(
        &self,
        file_id: &str,
        options: &DownloadOptions,
    ) -> StowageResult<DownloadedFile> {
        let session = self.session.acquire().await?;
        let url = format!(
            "{}/api/v1/download_by_id?fileId={}",
            session.download_base_url.trim_end_matches('/'),
            encode_file_name(file_id)
        );
        self.fetch(&session, url, file_id, None, options).await
    }

    async fn fetch(
        &self,
        session: &AuthSession,
        url: String,
        target: &str,
        fallback_name: Option<&str>,
        options: &DownloadOptions,
    ) -> StowageResult<DownloadedFile> {
        debug!(file = target, "downloading from store");

        let mut request = self.http.get(&url).bearer_auth(&session.bearer_token);
        if let Some((start, end)) = options.range {
            request = request.header(RANGE, format!("bytes={}-{}", start, end));
        }

        let response = request.send().await.map_err(|e| {
            StowageError::download_transport(target, format!("download request failed: {}", e))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StowageError::NotFound {
                target: target.to_string(),
            });
        }
        if status == StatusCode::UNAUTHORIZED {
            // The session the request used is dead; next caller re-authenticates
            self.session.invalidate().await;
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StowageError::Download {
                target: target.to_string(),
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let header_name = response
            .headers()
            .get(FILE_NAME_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|encoded| percent_decode_str(encoded).decode_utf8_lossy().into_owned());
        let file_name = header_name
            .or_else(|| fallback_name.map(str::to_string))
            .unwrap_or_else(|| target.to_string());

        let declared_length = response.content_length().filter(|length| *length > 0);
        let mut bytes = Vec::with_capacity(initial_capacity(declared_length));
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                StowageError::download_transport(target, format!("failed to read body: {}", e))
            })?;
            bytes.extend_from_slice(&chunk);
            if let (Some(on_progress), Some(total)) = (&options.on_progress, declared_length) {
                on_progress(bytes.len() as f64 / total as f64);
            }
        }
        if let Some(on_progress) = &options.on_progress {
            on_progress(1.0);
        }

        debug!(file = target, received = bytes.len(), "download complete");
        Ok(DownloadedFile {
            content_length: bytes.len() as u64,
            bytes,
            content_type,
            file_name,
        })
    }
}
