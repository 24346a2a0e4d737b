//! SSDP `M-SEARCH` for UPnP media servers on the local network.

use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::catalog::CatalogError;

/// Multicast group and port every UPnP device listens on.
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// Search target for media servers.
pub const MEDIA_SERVER_SEARCH_TARGET: &str = "urn:schemas-upnp-org:device:MediaServer:1";

/// Maximum seconds devices may wait before answering.
const SEARCH_MX_SECS: u64 = 2;

const RESPONSE_BUFFER_BYTES: usize = 4096;

/// Builds the `M-SEARCH` datagram.
pub(crate) fn search_request() -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {SSDP_MULTICAST_ADDR}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {SEARCH_MX_SECS}\r\n\
         ST: {MEDIA_SERVER_SEARCH_TARGET}\r\n\
         \r\n"
    )
}

/// Extracts the `LOCATION` header from a search response.
pub(crate) fn parse_location(response: &str) -> Option<String> {
    response.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("location")
            .then(|| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// Sends one search and collects distinct device locations until `wait` elapses.
///
/// # Errors
///
/// Returns [`CatalogError::Socket`] when the UDP socket cannot be used.
#[instrument]
pub async fn search(wait: Duration) -> Result<Vec<String>, CatalogError> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(CatalogError::socket)?;
    socket
        .send_to(search_request().as_bytes(), SSDP_MULTICAST_ADDR)
        .await
        .map_err(CatalogError::socket)?;

    let deadline = Instant::now() + wait;
    let mut buffer = [0u8; RESPONSE_BUFFER_BYTES];
    let mut locations: Vec<String> = Vec::new();

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, socket.recv_from(&mut buffer)).await {
            Err(_) => break,
            Ok(Err(error)) => return Err(CatalogError::socket(error)),
            Ok(Ok((len, peer))) => {
                let text = String::from_utf8_lossy(&buffer[..len]);
                if let Some(location) = parse_location(&text)
                    && !locations.contains(&location)
                {
                    debug!(%peer, %location, "SSDP response");
                    locations.push(location);
                }
            }
        }
    }

    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_targets_media_servers() {
        let request = search_request();
        assert!(request.starts_with("M-SEARCH * HTTP/1.1\r\n"));
        assert!(request.contains("MAN: \"ssdp:discover\"\r\n"));
        assert!(request.contains(&format!("ST: {MEDIA_SERVER_SEARCH_TARGET}\r\n")));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_parse_location_is_case_insensitive() {
        let response = "HTTP/1.1 200 OK\r\nCACHE-CONTROL: max-age=1800\r\nLocation: http://192.168.1.20:49152/MediaServer.xml\r\nST: upnp:rootdevice\r\n\r\n";
        assert_eq!(
            parse_location(response).as_deref(),
            Some("http://192.168.1.20:49152/MediaServer.xml")
        );
    }

    #[test]
    fn test_parse_location_missing() {
        assert_eq!(parse_location("HTTP/1.1 200 OK\r\nST: x\r\n\r\n"), None);
        assert_eq!(parse_location("HTTP/1.1 200 OK\r\nLOCATION:\r\n\r\n"), None);
    }
}
