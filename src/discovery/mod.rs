//! Locating the Fetch TV box on the local network.
//!
//! Discovery either multicasts an SSDP search or, when an address is given,
//! goes straight to the box's well-known descriptor URL. Candidate device
//! descriptors are fetched and the first one made by Fetch TV wins.

mod descriptor;
pub mod ssdp;

use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::catalog::{CatalogError, UpnpCatalog};
use crate::download::HttpClient;

/// Default UPnP port of the Fetch TV box.
pub const FETCHTV_PORT: u16 = 49152;

/// Manufacturer URL advertised by Fetch TV devices.
pub const FETCH_MANUFACTURER_URL: &str = "http://www.fetch.com/";

/// Default time to wait for SSDP responses.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);

/// How to find the box.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Skip SSDP and use this address directly.
    pub ip: Option<String>,
    /// Port used together with `ip`.
    pub port: u16,
    /// How long to collect SSDP responses.
    pub timeout: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            ip: None,
            port: FETCHTV_PORT,
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }
}

impl DiscoveryOptions {
    /// Returns the descriptor URL for a directly addressed box.
    #[must_use]
    pub fn direct_location(&self) -> Option<String> {
        self.ip
            .as_deref()
            .map(|ip| format!("http://{ip}:{}/MediaServer.xml", self.port))
    }
}

/// Device details of a discovered media server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaServer {
    pub friendly_name: String,
    pub manufacturer: String,
    pub manufacturer_url: String,
    pub model_name: String,
    pub model_number: String,
    pub serial_number: String,
    pub udn: String,
    /// Descriptor URL the device was found at.
    pub location: String,
    /// Absolute `ContentDirectory` control URL, when the device offers one.
    pub content_directory_url: Option<String>,
}

impl MediaServer {
    /// Returns true when the device identifies itself as a Fetch TV box.
    #[must_use]
    pub fn is_fetch(&self) -> bool {
        self.manufacturer_url.trim() == FETCH_MANUFACTURER_URL
    }

    /// Builds a catalog reader for this server.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidResponse`] when the device exposes no
    /// `ContentDirectory` service.
    pub fn catalog(&self, http: &HttpClient) -> Result<UpnpCatalog, CatalogError> {
        let control_url = self.content_directory_url.as_deref().ok_or_else(|| {
            CatalogError::invalid_response(&self.location, "no ContentDirectory service")
        })?;
        Ok(UpnpCatalog::new(http.clone(), control_url))
    }
}

/// Finds the Fetch TV box.
///
/// # Errors
///
/// Returns [`CatalogError::DiscoveryUnavailable`] when no Fetch TV server can
/// be located, or [`CatalogError::Socket`] when SSDP cannot run at all.
#[instrument(skip(http))]
pub async fn discover(
    http: &HttpClient,
    options: &DiscoveryOptions,
) -> Result<MediaServer, CatalogError> {
    let locations = match options.direct_location() {
        Some(location) => vec![location],
        None => ssdp::search(options.timeout).await?,
    };
    if locations.is_empty() {
        return Err(CatalogError::discovery_unavailable(
            "no UPnP media servers responded",
        ));
    }

    let mut last_error = None;
    for location in &locations {
        match fetch_descriptor(http, location).await {
            Ok(server) if server.is_fetch() => {
                info!(
                    location = %server.location,
                    name = %server.friendly_name,
                    "discovered Fetch TV server"
                );
                return Ok(server);
            }
            Ok(server) => {
                info!(
                    location = %location,
                    manufacturer = %server.manufacturer,
                    "ignoring non-Fetch media server"
                );
            }
            Err(error) => {
                warn!(location = %location, error = %error, "failed to read device descriptor");
                last_error = Some(error);
            }
        }
    }

    let reason = match last_error {
        Some(error) if locations.len() == 1 => error.to_string(),
        _ => format!(
            "none of {} media server(s) is a Fetch TV box",
            locations.len()
        ),
    };
    Err(CatalogError::discovery_unavailable(reason))
}

/// Fetches and parses the device descriptor at `location`.
///
/// # Errors
///
/// Returns [`CatalogError`] on transport failure, error status or an
/// unparseable descriptor.
pub async fn fetch_descriptor(
    http: &HttpClient,
    location: &str,
) -> Result<MediaServer, CatalogError> {
    let response = http
        .inner()
        .get(location)
        .timeout(http.request_timeout())
        .send()
        .await
        .map_err(|e| CatalogError::from_request(location, e))?;
    if !response.status().is_success() {
        return Err(CatalogError::http_status(
            location,
            response.status().as_u16(),
        ));
    }
    let document = response
        .text()
        .await
        .map_err(|e| CatalogError::from_request(location, e))?;
    descriptor::parse_descriptor(location, &document)
        .map_err(|reason| CatalogError::invalid_response(location, reason))
}
