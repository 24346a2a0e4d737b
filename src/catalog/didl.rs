//! DIDL-Lite parsing for `ContentDirectory` browse results.

use tracing::debug;

use super::{Directory, Item};
use crate::xml;

/// Containers and items found in one DIDL-Lite document.
#[derive(Debug, Default)]
pub(crate) struct DidlListing {
    pub containers: Vec<Directory>,
    pub items: Vec<Item>,
}

impl DidlListing {
    pub(crate) fn extend(&mut self, other: Self) {
        self.containers.extend(other.containers);
        self.items.extend(other.items);
    }
}

/// Parses an (already unescaped) DIDL-Lite document.
///
/// Containers become empty [`Directory`] values; items without an id or a
/// `res` URL are dropped since they cannot be saved.
pub(crate) fn parse_didl(didl: &str) -> DidlListing {
    let containers = xml::elements(didl, "container")
        .into_iter()
        .filter_map(|container| {
            let id = container.attribute("id")?;
            let title = container.child_text("dc:title").unwrap_or_default();
            Some(Directory::new(id, title))
        })
        .collect();

    let items = xml::elements(didl, "item")
        .into_iter()
        .filter_map(|element| {
            let id = element.attribute("id")?;
            let title = element.child_text("dc:title").unwrap_or_default();
            let Some(res) = xml::elements(element.inner, "res").into_iter().next() else {
                debug!(item_id = %id, "item has no res element, skipping");
                return None;
            };
            let url = xml::unescape(res.inner.trim());
            if url.is_empty() {
                debug!(item_id = %id, "item has an empty res URL, skipping");
                return None;
            }
            Some(Item {
                id,
                title,
                url,
                duration: res.attribute("duration"),
                size: res.attribute("size").and_then(|size| size.trim().parse().ok()),
                description: element
                    .child_text("dc:description")
                    .or_else(|| element.child_text("upnp:longDescription")),
            })
        })
        .collect();

    DidlListing { containers, items }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">
<container id="0/1/5" parentID="0/1" restricted="1" childCount="2"><dc:title>Drama &amp; Crime</dc:title><upnp:class>object.container.storageFolder</upnp:class></container>
<item id="0/1/5/7" parentID="0/1/5" restricted="1"><dc:title>S01 E02 Pilot</dc:title><dc:description>The first one</dc:description><upnp:class>object.item.videoItem</upnp:class><res protocolInfo="http-get:*:video/mpeg:*" size="1048576" duration="0:30:00.000">http://10.0.0.2:49152/web/1234.ts?a=1&amp;b=2</res></item>
<item id="0/1/5/8" parentID="0/1/5" restricted="1"><dc:title>No media</dc:title></item>
<item id="0/1/5/9" parentID="0/1/5" restricted="1"><dc:title>Movie Night</dc:title><upnp:longDescription>Long text</upnp:longDescription><res>http://10.0.0.2:49152/web/9.ts</res></item>
</DIDL-Lite>"#;

    #[test]
    fn test_parse_didl_containers() {
        let listing = parse_didl(SAMPLE);
        assert_eq!(
            listing.containers,
            vec![Directory::new("0/1/5", "Drama & Crime")]
        );
    }

    #[test]
    fn test_parse_didl_items_with_metadata() {
        let listing = parse_didl(SAMPLE);
        assert_eq!(listing.items.len(), 2, "item without res is skipped");

        let pilot = &listing.items[0];
        assert_eq!(pilot.id, "0/1/5/7");
        assert_eq!(pilot.title, "S01 E02 Pilot");
        assert_eq!(pilot.url, "http://10.0.0.2:49152/web/1234.ts?a=1&b=2");
        assert_eq!(pilot.size, Some(1_048_576));
        assert_eq!(pilot.duration.as_deref(), Some("0:30:00.000"));
        assert_eq!(pilot.description.as_deref(), Some("The first one"));

        let movie = &listing.items[1];
        assert_eq!(movie.size, None);
        assert_eq!(movie.duration, None);
        assert_eq!(movie.description.as_deref(), Some("Long text"));
    }

    #[test]
    fn test_parse_didl_empty_document() {
        let listing = parse_didl("<DIDL-Lite></DIDL-Lite>");
        assert!(listing.containers.is_empty());
        assert!(listing.items.is_empty());
    }
}
