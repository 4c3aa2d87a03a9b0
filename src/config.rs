//! Runtime configuration passed explicitly to the client at construction.

use std::time::Duration;

use crate::download::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_ACCELERATOR, DOWNLOAD_READ_TIMEOUT_SECS, METADATA_TIMEOUT_SECS,
};

/// Default repository base URL.
pub const DEFAULT_BASE_URL: &str = "https://f-droid.org";

/// Settings for repository access and downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Repository base URL; a trailing `/` is ignored.
    pub base_url: String,
    /// Total timeout for search and package detail requests.
    pub metadata_timeout: Duration,
    /// TCP/TLS connect timeout for every request.
    pub connect_timeout: Duration,
    /// Idle timeout between body reads while streaming an APK.
    pub download_read_timeout: Duration,
    /// Accelerator program to probe for; `None` always streams over HTTP.
    pub accelerator: Option<String>,
    /// Honor proxy environment variables (`HTTPS_PROXY`, `ALL_PROXY`, ...).
    pub trust_env: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            metadata_timeout: Duration::from_secs(METADATA_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            download_read_timeout: Duration::from_secs(DOWNLOAD_READ_TIMEOUT_SECS),
            accelerator: Some(DEFAULT_ACCELERATOR.to_string()),
            trust_env: true,
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at another repository.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Disables the external accelerator.
    #[must_use]
    pub fn without_accelerator(mut self) -> Self {
        self.accelerator = None;
        self
    }

    /// Base URL without trailing slashes.
    #[must_use]
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
