//! HTTP client wrapper for talking to the box.
//!
//! This module provides the `HttpClient` struct which opens media streams
//! with bounded header waits and reads their declared length, plus the
//! shared `reqwest` client used for SOAP and descriptor requests.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tracing::{debug, instrument};
use url::Url;

use super::constants::{
    CONNECT_TIMEOUT_SECS, LIVE_RECORDING_LENGTH, READ_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS,
};
use super::error::DownloadError;

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("fetchtv/", env!("CARGO_PKG_VERSION"));

/// Timeout configuration for [`HttpClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// TCP connect timeout.
    pub connect: Duration,
    /// Maximum idle time between body reads.
    pub read: Duration,
    /// Maximum wait for response headers.
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read: Duration::from_secs(READ_TIMEOUT_SECS),
            request: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// HTTP client shared by discovery, catalog browsing and downloads.
///
/// Created once and cloned freely; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    request_timeout: Duration,
}

/// A media response whose headers have been read but whose body has not.
#[derive(Debug)]
pub struct MediaResponse {
    url: String,
    response: reqwest::Response,
    content_length: Option<u64>,
}

impl MediaResponse {
    /// Declared Content-Length, if the server sent one.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Returns true when the declared length is the still-recording sentinel.
    #[must_use]
    pub fn is_live(&self) -> bool {
        is_live_length(self.content_length)
    }

    /// The requested URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn into_response(self) -> reqwest::Response {
        self.response
    }
}

/// Returns true when `content_length` marks a recording that is still growing.
#[must_use]
pub fn is_live_length(content_length: Option<u64>) -> bool {
    content_length == Some(LIVE_RECORDING_LENGTH)
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeouts(HttpTimeouts::default())
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(timeouts: HttpTimeouts) -> Self {
        let client = build_client(timeouts)
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            request_timeout: timeouts.request,
        }
    }

    /// Sends a streaming GET and returns once the response headers are in.
    ///
    /// The body is left unread; dropping the returned value closes the
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - Headers do not arrive within the request timeout
    /// - The request fails at the network level
    /// - The server returns an error status (4xx, 5xx)
    #[instrument(level = "debug", skip(self))]
    pub async fn open_media(&self, url: &str) -> Result<MediaResponse, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = tokio::time::timeout(self.request_timeout, self.client.get(url).send())
            .await
            .map_err(|_| DownloadError::timeout(url))?
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        debug!(?content_length, "media headers received");

        Ok(MediaResponse {
            url: url.to_string(),
            response,
            content_length,
        })
    }

    /// Reads only the headers of `url` and reports whether it is still recording.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`open_media`](Self::open_media).
    #[instrument(level = "debug", skip(self))]
    pub async fn probe_live(&self, url: &str) -> Result<bool, DownloadError> {
        let media = self.open_media(url).await?;
        let live = media.is_live();
        drop(media);
        Ok(live)
    }

    /// Maximum wait for response headers on any request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

fn build_client(timeouts: HttpTimeouts) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .read_timeout(timeouts.read)
        .user_agent(USER_AGENT)
        .build()
}
