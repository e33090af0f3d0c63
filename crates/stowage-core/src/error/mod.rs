//! Error types and result aliases for stowage operations.
//!
//! Provides a unified error type that covers all failure modes of the
//! store client with actionable error messages. None of these errors is
//! retried internally; every component fails fast and reports upward.

use thiserror::Error;

/// Unified error type for all stowage operations
#[derive(Error, Debug)]
pub enum StowageError {
    // Config errors
    #[error("Invalid client configuration: {message}")]
    Config { message: String },

    // Auth errors
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Endpoint errors
    #[error("Failed to acquire upload endpoint for bucket '{bucket_id}': {message}")]
    EndpointAcquisition {
        bucket_id: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Upload errors
    #[error("Upload of '{file_name}' failed{}: {message}", status_suffix(.status))]
    Upload {
        file_name: String,
        status: Option<u16>,
        message: String,
    },

    // Download errors
    #[error("Download of '{target}' failed{}: {message}", status_suffix(.status))]
    Download {
        target: String,
        status: Option<u16>,
        message: String,
    },

    #[error("'{target}' not found in the store")]
    NotFound { target: String },

    // Archive errors
    #[error("Malformed archive: {message}")]
    ArchiveFormat { message: String },

    // Ancillary API calls (list, delete)
    #[error("Store API call '{operation}' failed{}: {message}", status_suffix(.status))]
    Api {
        operation: String,
        status: Option<u16>,
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {}", code),
        None => String::new(),
    }
}

/// Result type alias for stowage operations
pub type StowageResult<T> = Result<T, StowageError>;

impl StowageError {
    /// Create an authentication error from any error type
    pub fn authentication<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Authentication {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an endpoint acquisition error from any error type
    pub fn endpoint<E>(bucket_id: impl Into<String>, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::EndpointAcquisition {
            bucket_id: bucket_id.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an upload error without an HTTP status (transport-level failure)
    pub fn upload_transport(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            file_name: file_name.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Create a download error without an HTTP status (transport-level failure)
    pub fn download_transport(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Download {
            target: target.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Check whether this error means the download target does not exist,
    /// as opposed to a transient failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, StowageError::NotFound { .. })
    }

    /// HTTP status carried by the error, if the store responded at all
    pub fn status(&self) -> Option<u16> {
        match self {
            StowageError::Upload { status, .. } | StowageError::Download { status, .. } => *status,
            StowageError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}
