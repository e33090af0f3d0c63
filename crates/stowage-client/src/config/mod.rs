//! Client configuration values
//!
//! The surrounding application reads its environment/config files and
//! hands the core plain values; this module only holds them.

use std::time::Duration;

use stowage_core::Credentials;

/// Authorization endpoint used when the caller does not override it
pub const DEFAULT_AUTH_BASE_URL: &str = "https://api.stowage.io";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a [`StoreClient`](crate::StoreClient) instance.
///
/// Immutable once the client is constructed; independent clients with
/// different configs can coexist because all caches live inside the client
/// instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Account credentials for the authorization exchange
    pub credentials: Credentials,
    /// Bucket id used for uploads and endpoint caching
    pub bucket_id: String,
    /// Bucket name used in download-by-name paths
    pub bucket_name: String,
    /// Base URL of the fixed authorization endpoint
    pub auth_base_url: String,
    /// Timeout applied to every HTTP call
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a config with default auth endpoint and timeout
    pub fn new(
        credentials: Credentials,
        bucket_id: impl Into<String>,
        bucket_name: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            bucket_id: bucket_id.into(),
            bucket_name: bucket_name.into(),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the authorization endpoint (test servers, private deployments)
    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = url.into();
        self
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new(Credentials::new("id", "key"), "bucket-1", "my-bucket");
        assert_eq!(config.auth_base_url, DEFAULT_AUTH_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_config_overrides() {
        let config = ClientConfig::new(Credentials::new("id", "key"), "b", "n")
            .with_auth_base_url("http://localhost:9000")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.auth_base_url, "http://localhost:9000");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
