//! Error types for discovery and catalog retrieval.

use thiserror::Error;

/// Errors raised while locating the box or reading its catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No Fetch TV media server could be located.
    #[error("unable to locate a Fetch TV media server: {reason}")]
    DiscoveryUnavailable {
        /// What went wrong during discovery.
        reason: String,
    },

    /// Network-level failure talking to the box.
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The box answered with a non-success status.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be understood.
    #[error("invalid response from {url}: {reason}")]
    InvalidResponse {
        /// The URL whose response was malformed.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Local socket error during SSDP discovery.
    #[error("discovery socket error: {source}")]
    Socket {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// Creates a discovery-unavailable error.
    pub fn discovery_unavailable(reason: impl Into<String>) -> Self {
        Self::DiscoveryUnavailable {
            reason: reason.into(),
        }
    }

    /// Maps a reqwest error, separating timeouts from other network failures.
    pub fn from_request(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a socket error.
    pub fn socket(source: std::io::Error) -> Self {
        Self::Socket { source }
    }

    /// Returns true when the error means no server is reachable at all.
    #[must_use]
    pub fn is_discovery_failure(&self) -> bool {
        matches!(self, Self::DiscoveryUnavailable { .. } | Self::Socket { .. })
    }
}
