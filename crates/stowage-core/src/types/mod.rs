//! Core data types for store operations

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Account credentials for the store.
///
/// Opaque to the client; supplied by the caller at construction and
/// immutable for the client's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Key identifier (the "username" half of the credential exchange)
    pub key_id: String,
    /// Application key (the "password" half)
    pub key: String,
}

impl Credentials {
    pub fn new(key_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key: key.into(),
        }
    }
}

/// Record describing one stored file, as returned by a successful upload
/// or a list-file-names page.
///
/// A FileRecord may represent a single logical payload or an encoded
/// archive bundle; the store cannot tell the two apart. Bundles are marked
/// through `custom_info` (`archive=true` plus the original file count).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileRecord {
    /// Store-assigned file id
    #[serde(rename = "fileId")]
    pub file_id: String,
    /// File name as stored
    #[serde(rename = "fileName")]
    pub file_name: String,
    /// MIME content type
    #[serde(rename = "contentType")]
    pub content_type: String,
    /// Payload length in bytes
    #[serde(rename = "contentLength")]
    pub content_length: u64,
    /// Hex SHA-1 digest of the payload
    #[serde(rename = "contentSha1")]
    pub content_digest: String,
    /// Caller-supplied metadata echoed back by the store
    #[serde(rename = "fileInfo", default)]
    pub custom_info: HashMap<String, String>,
    /// Bucket the file lives in
    #[serde(rename = "bucketId", default)]
    pub bucket_id: Option<String>,
    /// Store-side upload time, milliseconds since the epoch
    #[serde(rename = "uploadTimestamp", default)]
    pub upload_timestamp: Option<u64>,
}

impl FileRecord {
    /// Whether this record was marked as an encoded archive bundle at
    /// upload time
    pub fn is_archive(&self) -> bool {
        self.custom_info.get("archive").map(String::as_str) == Some("true")
    }
}
