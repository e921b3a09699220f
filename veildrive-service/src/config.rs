//! Service configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the drive service, constructed once at process start
/// and passed to each component.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Largest content size accepted for a single upload, in bytes.
    /// Oversized uploads are rejected before any crypto runs.
    pub max_content_len: usize,

    /// Minimum password length accepted at registration and password change.
    pub min_password_len: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_content_len: 64 * 1024 * 1024, // 64 MiB
            min_password_len: 8,
        }
    }
}

impl ServiceConfig {
    /// Creates a config with small limits for testing.
    pub fn test() -> Self {
        Self {
            max_content_len: 64 * 1024,
            min_password_len: 8,
        }
    }
}
