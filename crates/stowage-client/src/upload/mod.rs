//! Single-payload upload pipeline
//!
//! One upload is: obtain the bucket's endpoint (cache hit or miss), digest
//! the payload, build metadata headers, POST the full buffer with the
//! endpoint's upload token as bearer credential. Any failure invalidates
//! the endpoint so the next upload fetches a fresh one; nothing is retried
//! here.

use std::collections::HashMap;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use stowage_core::{hash, FileRecord, StowageError, StowageResult};

use crate::endpoint::EndpointCache;
use crate::ProgressCallback;

/// Content type sent when the caller does not name one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Request header carrying the percent-encoded file name
pub const FILE_NAME_HEADER: &str = "X-File-Name";

/// Request header carrying the payload's hex SHA-1 digest
pub const CONTENT_SHA1_HEADER: &str = "X-Content-Sha1";

/// Prefix for per-entry custom-info headers
pub const INFO_HEADER_PREFIX: &str = "X-Info-";

/// Payload bytes handed to the transport per progress report
const UPLOAD_CHUNK: usize = 64 * 1024;

// File names keep '/' so path-style names keep their separators; every
// other reserved character is encoded exactly once.
const FILE_NAME_KEEP: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'.')
    .remove(b'_')
    .remove(b'-')
    .remove(b'~');

const HEADER_VALUE_KEEP: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'_')
    .remove(b'-')
    .remove(b'~');

/// Percent-encode a file name for the upload header and download paths
pub fn encode_file_name(name: &str) -> String {
    utf8_percent_encode(name, FILE_NAME_KEEP).to_string()
}

/// Percent-encode a custom-info value for its header
pub fn encode_header_value(value: &str) -> String {
    utf8_percent_encode(value, HEADER_VALUE_KEEP).to_string()
}

/// Per-upload options
#[derive(Clone, Default)]
pub struct UploadOptions {
    /// MIME type; defaults to [`DEFAULT_CONTENT_TYPE`]
    pub content_type: Option<String>,
    /// Caller metadata, one `X-Info-*` header per entry
    pub custom_info: HashMap<String, String>,
    /// Fractional progress reports while the body streams out
    pub on_progress: Option<ProgressCallback>,
}

impl UploadOptions {
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_info.insert(key.into(), value.into());
        self
    }
}

/// Uploads one payload per call against a configured bucket
#[derive(Debug)]
pub struct UploadPipeline {
    http: Client,
    endpoints: Arc<EndpointCache>,
    bucket_id: String,
}

impl UploadPipeline {
    pub fn new(http: Client, endpoints: Arc<EndpointCache>, bucket_id: impl Into<String>) -> Self {
        Self {
            http,
            endpoints,
            bucket_id: bucket_id.into(),
        }
    }

    /// Upload `bytes` as `file_name` and return the store's record.
    ///
    /// Zero-length payloads are valid: they carry the digest of the empty
    /// byte sequence and `Content-Length: 0`.
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> StowageResult<FileRecord> {
        let endpoint = self.endpoints.get(&self.bucket_id).await?;

        let digest = hash::digest(&bytes);
        let content_length = bytes.len() as u64;
        let content_type = options
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        debug!(file_name, content_length, "uploading payload");

        let mut request = self
            .http
            .post(&endpoint.upload_url)
            .bearer_auth(&endpoint.upload_token)
            .header(FILE_NAME_HEADER, encode_file_name(file_name))
            .header(reqwest::header::CONTENT_TYPE, &content_type)
            .header(reqwest::header::CONTENT_LENGTH, content_length)
            .header(CONTENT_SHA1_HEADER, &digest);
        for (key, value) in &options.custom_info {
            request = request.header(
                format!("{}{}", INFO_HEADER_PREFIX, key),
                encode_header_value(value),
            );
        }
        let request = request.body(progress_body(bytes, options.on_progress.clone()));

        let result = self.send(request, file_name).await;
        match &result {
            Ok(record) => {
                if let Some(on_progress) = &options.on_progress {
                    on_progress(1.0);
                }
                debug!(file_id = %record.file_id, "upload complete");
            }
            Err(_) => {
                // The endpoint may be poisoned or single-use; drop it so
                // the next upload to this bucket fetches a fresh one.
                self.endpoints.invalidate(&self.bucket_id).await;
            }
        }
        result
    }

    async fn send(&self, request: RequestBuilder, file_name: &str) -> StowageResult<FileRecord> {
        let response = request.send().await.map_err(|e| {
            StowageError::upload_transport(file_name, format!("upload request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StowageError::Upload {
                file_name: file_name.to_string(),
                status: Some(status.as_u16()),
                message: body,
            });
        }

        response.json::<FileRecord>().await.map_err(|e| {
            StowageError::upload_transport(file_name, format!("malformed upload response: {}", e))
        })
    }
}

/// Build the request body, streaming in chunks when progress reporting is
/// requested so the callback observes bytes as the transport takes them.
fn progress_body(bytes: Vec<u8>, on_progress: Option<ProgressCallback>) -> reqwest::Body {
    let on_progress = match on_progress {
        Some(on_progress) if !bytes.is_empty() => on_progress,
        _ => return reqwest::Body::from(bytes),
    };

    let total = bytes.len();
    let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK).map(<[u8]>::to_vec).collect();
    let mut sent = 0usize;
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len();
        on_progress(sent as f64 / total as f64);
        Ok::<Vec<u8>, std::io::Error>(chunk)
    }));
    reqwest::Body::wrap_stream(stream)
}
