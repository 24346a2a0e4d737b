//! UPnP device descriptor parsing.

use url::Url;

use super::MediaServer;
use crate::xml;

const CONTENT_DIRECTORY_SERVICE_PREFIX: &str = "urn:schemas-upnp-org:service:ContentDirectory:";

/// Parses a device descriptor fetched from `location`.
///
/// The `ContentDirectory` control URL is resolved against `URLBase` when
/// present, otherwise against the descriptor location.
pub(crate) fn parse_descriptor(location: &str, document: &str) -> Result<MediaServer, String> {
    let Some(device) = xml::elements(document, "device").into_iter().next() else {
        return Err("descriptor has no device element".to_string());
    };
    let text = |tag: &str| device.child_text(tag).unwrap_or_default();

    let base = xml::first_text(document, "URLBase").unwrap_or_else(|| location.to_string());
    let control_url = xml::elements(device.inner, "service")
        .into_iter()
        .find(|service| {
            service
                .child_text("serviceType")
                .is_some_and(|kind| kind.starts_with(CONTENT_DIRECTORY_SERVICE_PREFIX))
        })
        .and_then(|service| service.child_text("controlURL"))
        .map(|control| resolve_url(&base, &control))
        .transpose()?;

    Ok(MediaServer {
        friendly_name: text("friendlyName"),
        manufacturer: text("manufacturer"),
        manufacturer_url: text("manufacturerURL"),
        model_name: text("modelName"),
        model_number: text("modelNumber"),
        serial_number: text("serialNumber"),
        udn: text("UDN"),
        location: location.to_string(),
        content_directory_url: control_url,
    })
}

fn resolve_url(base: &str, relative: &str) -> Result<String, String> {
    let base = Url::parse(base).map_err(|e| format!("invalid base URL {base}: {e}"))?;
    base.join(relative)
        .map(String::from)
        .map_err(|e| format!("invalid control URL {relative}: {e}"))
}
