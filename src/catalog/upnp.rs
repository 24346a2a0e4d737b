//! `ContentDirectory` browsing over SOAP.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use super::didl::{DidlListing, parse_didl};
use super::{CatalogError, CatalogSource, Directory};
use crate::download::HttpClient;
use crate::xml;

/// Object id of the `ContentDirectory` root.
pub const ROOT_OBJECT_ID: &str = "0";

const CONTENT_DIRECTORY_SERVICE: &str = "urn:schemas-upnp-org:service:ContentDirectory:1";

/// Catalog backed by a UPnP `ContentDirectory` control endpoint.
#[derive(Debug, Clone)]
pub struct UpnpCatalog {
    http: HttpClient,
    control_url: String,
}

/// One page of a `Browse` response.
#[derive(Debug, Default, PartialEq, Eq)]
struct BrowsePage {
    didl: String,
    number_returned: u32,
    total_matches: u32,
}

impl UpnpCatalog {
    /// Creates a catalog that browses `control_url` with the shared client.
    pub fn new(http: HttpClient, control_url: impl Into<String>) -> Self {
        Self {
            http,
            control_url: control_url.into(),
        }
    }

    /// Returns the control URL browse requests are sent to.
    #[must_use]
    pub fn control_url(&self) -> &str {
        &self.control_url
    }

    /// Browses all direct children of `object_id`, following pagination.
    async fn browse(&self, object_id: &str) -> Result<DidlListing, CatalogError> {
        let mut listing = DidlListing::default();
        let mut start = 0u32;
        loop {
            let page = self.browse_page(object_id, start).await?;
            listing.extend(parse_didl(&page.didl));
            start = start.saturating_add(page.number_returned);
            if page.number_returned == 0 || start >= page.total_matches {
                break;
            }
            debug!(object_id, start, total = page.total_matches, "fetching next browse page");
        }
        Ok(listing)
    }

    async fn browse_page(&self, object_id: &str, start: u32) -> Result<BrowsePage, CatalogError> {
        let url = self.control_url.as_str();
        let response = self
            .http
            .inner()
            .post(url)
            .timeout(self.http.request_timeout())
            .header(CONTENT_TYPE, "text/xml; charset=\"utf-8\"")
            .header("SOAPAction", format!("\"{CONTENT_DIRECTORY_SERVICE}#Browse\""))
            .body(browse_envelope(object_id, start))
            .send()
            .await
            .map_err(|e| CatalogError::from_request(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(
                status = status.as_u16(),
                fault = xml::first_text(&body, "errorDescription").unwrap_or_default(),
                "browse request rejected"
            );
            return Err(CatalogError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::from_request(url, e))?;
        parse_browse_response(&body).map_err(|reason| CatalogError::invalid_response(url, reason))
    }
}

#[async_trait]
impl CatalogSource for UpnpCatalog {
    #[instrument(skip(self), fields(control_url = %self.control_url))]
    async fn list_directories(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<Directory>, CatalogError> {
        let object_id = parent_id.unwrap_or(ROOT_OBJECT_ID);
        let listing = self.browse(object_id).await?;

        let mut directories = Vec::with_capacity(listing.containers.len());
        for mut directory in listing.containers {
            directory.items = self.browse(&directory.id).await?.items;
            debug!(
                folder = %directory.title,
                items = directory.items.len(),
                "browsed folder"
            );
            directories.push(directory);
        }
        Ok(directories)
    }
}

fn browse_envelope(object_id: &str, start: u32) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
            r#"<s:Body><u:Browse xmlns:u="{service}">"#,
            "<ObjectID>{object_id}</ObjectID>",
            "<BrowseFlag>BrowseDirectChildren</BrowseFlag>",
            "<Filter>*</Filter>",
            "<StartingIndex>{start}</StartingIndex>",
            "<RequestedCount>0</RequestedCount>",
            "<SortCriteria></SortCriteria>",
            "</u:Browse></s:Body></s:Envelope>"
        ),
        service = CONTENT_DIRECTORY_SERVICE,
        object_id = xml::escape(object_id),
        start = start,
    )
}

fn parse_browse_response(body: &str) -> Result<BrowsePage, String> {
    if let Some(fault) = xml::elements(body, "s:Fault").first() {
        let reason = xml::first_text(fault.inner, "errorDescription")
            .or_else(|| xml::first_text(fault.inner, "faultstring"))
            .unwrap_or_else(|| "SOAP fault".to_string());
        return Err(reason);
    }

    if xml::elements(body, "Result").is_empty() {
        return Err("browse response has no Result element".to_string());
    }

    let count = |tag: &str| {
        xml::first_text(body, tag)
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(0)
    };

    Ok(BrowsePage {
        didl: xml::first_text(body, "Result").unwrap_or_default(),
        number_returned: count("NumberReturned"),
        total_matches: count("TotalMatches"),
    })
}
