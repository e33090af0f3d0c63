//! Object-store client for token-authenticated, S3-like services
//!
//! This crate provides the network side of stowage: lazy bearer-token
//! authentication, per-bucket upload-endpoint caching, integrity-checked
//! uploads and downloads, and permit-bounded batch fan-out. It is a
//! library with no CLI surface; configuration arrives as plain values in
//! [`ClientConfig`].
//!
//! Nothing here retries: every operation fails fast with a typed
//! [`StowageError`], and the only self-healing behavior is cache
//! invalidation so the next call gets a fresh session or endpoint.

pub mod auth;
pub mod batch;
pub mod client;
pub mod config;
pub mod download;
pub mod endpoint;
pub mod upload;

// Re-export main types
pub use auth::{AuthSession, SessionManager};
pub use batch::{BatchUploader, Limiter};
pub use client::{FileNamePage, StoreClient};
pub use config::ClientConfig;
pub use download::{DownloadOptions, DownloadPipeline, DownloadedFile};
pub use endpoint::{EndpointCache, UploadEndpoint};
pub use upload::{UploadOptions, UploadPipeline};

pub use stowage_core::{Credentials, FileRecord, StowageError, StowageResult};

/// Progress callback invoked with a completed fraction in `[0.0, 1.0]`
pub type ProgressCallback = std::sync::Arc<dyn Fn(f64) + Send + Sync>;
