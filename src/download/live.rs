//! Live-recording detection.
//!
//! The box serves a recording that is still being written with a fixed,
//! absurdly large Content-Length. Reading the response headers is enough to
//! tell; the body is never consumed.

use async_trait::async_trait;

use super::{DownloadError, HttpClient};
use crate::catalog::Item;

/// Answers "is this item still being recorded?".
#[async_trait]
pub trait LiveProbe: Send + Sync {
    /// Probes `item` once.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the probe request itself fails.
    async fn is_recording(&self, item: &Item) -> Result<bool, DownloadError>;
}

#[async_trait]
impl LiveProbe for HttpClient {
    async fn is_recording(&self, item: &Item) -> Result<bool, DownloadError> {
        self.probe_live(&item.url).await
    }
}
