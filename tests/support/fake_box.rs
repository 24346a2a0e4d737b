//! A fake Fetch TV box mounted on a wiremock server.
//!
//! Serves the device descriptor at `/MediaServer.xml` and answers SOAP
//! `Browse` calls on `/cd/control` from a fixed folder tree:
//!
//! ```text
//! 0 (root)
//! ├── P  "Photos"
//! └── R  "Recordings"
//!     ├── R/1 "Drama"  -> items 7 "S01 E02 Pilot", 8 "S01 E03 Fallout" (two pages)
//!     └── R/2 "News"   -> item 21 "Evening News"
//! ```
//!
//! Item media is served from `/web/<id>.mpeg`.

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MANUFACTURER_URL: &str = "http://www.fetch.com/";

pub fn descriptor(manufacturer_url: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaServer:1</deviceType>
    <friendlyName>Fetch Test Box</friendlyName>
    <manufacturer>Fetch TV</manufacturer>
    <manufacturerURL>{manufacturer_url}</manufacturerURL>
    <modelName>Mighty</modelName>
    <modelNumber>H7160</modelNumber>
    <serialNumber>TEST0001</serialNumber>
    <UDN>uuid:test-box</UDN>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:ContentDirectory:1</serviceType>
        <controlURL>/cd/control</controlURL>
      </service>
    </serviceList>
  </device>
</root>"#
    )
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Wraps DIDL-Lite fragments in a SOAP `BrowseResponse`.
pub fn browse_response(fragments: &str, returned: u32, total: u32) -> String {
    let didl = format!(
        r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">{fragments}</DIDL-Lite>"#
    );
    format!(
        r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:BrowseResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1"><Result>{}</Result><NumberReturned>{returned}</NumberReturned><TotalMatches>{total}</TotalMatches><UpdateID>1</UpdateID></u:BrowseResponse></s:Body></s:Envelope>"#,
        escape(&didl)
    )
}

pub fn container(id: &str, title: &str) -> String {
    format!(
        r#"<container id="{id}" restricted="1"><dc:title>{}</dc:title><upnp:class>object.container.storageFolder</upnp:class></container>"#,
        escape(title)
    )
}

pub fn item(id: &str, title: &str, url: &str) -> String {
    format!(
        r#"<item id="{id}" restricted="1"><dc:title>{}</dc:title><upnp:class>object.item.videoItem</upnp:class><res protocolInfo="http-get:*:video/mpeg:*" duration="0:30:00.000" size="4">{}</res></item>"#,
        escape(title),
        escape(url)
    )
}

async fn mount_browse(server: &MockServer, object_id: &str, extra: Option<&str>, body: String) {
    let mut mock = Mock::given(method("POST"))
        .and(path("/cd/control"))
        .and(body_string_contains(format!("<ObjectID>{object_id}</ObjectID>")));
    if let Some(extra) = extra {
        mock = mock.and(body_string_contains(extra));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts the descriptor, browse tree and media endpoints.
pub async fn mount_fetch_box(server: &MockServer) {
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/MediaServer.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(descriptor(MANUFACTURER_URL)))
        .mount(server)
        .await;

    mount_browse(
        server,
        "0",
        None,
        browse_response(
            &format!("{}{}", container("P", "Photos"), container("R", "Recordings")),
            2,
            2,
        ),
    )
    .await;
    mount_browse(server, "P", None, browse_response("", 0, 0)).await;
    mount_browse(
        server,
        "R",
        None,
        browse_response(
            &format!("{}{}", container("R/1", "Drama"), container("R/2", "News")),
            2,
            2,
        ),
    )
    .await;
    mount_browse(
        server,
        "R/1",
        Some("<StartingIndex>0</StartingIndex>"),
        browse_response(
            &item("7", "S01 E02 Pilot", &format!("{base}/web/7.mpeg")),
            1,
            2,
        ),
    )
    .await;
    mount_browse(
        server,
        "R/1",
        Some("<StartingIndex>1</StartingIndex>"),
        browse_response(
            &item("8", "S01 E03 Fallout", &format!("{base}/web/8.mpeg")),
            1,
            2,
        ),
    )
    .await;
    mount_browse(
        server,
        "R/2",
        None,
        browse_response(
            &item("21", "Evening News", &format!("{base}/web/21.mpeg")),
            1,
            1,
        ),
    )
    .await;

    for id in ["7", "8", "21"] {
        Mock::given(method("GET"))
            .and(path(format!("/web/{id}.mpeg")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("m{id}").into_bytes()))
            .mount(server)
            .await;
    }
}
