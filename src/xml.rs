//! Minimal XML scanning for UPnP payloads.
//!
//! Device descriptors, SOAP envelopes and DIDL-Lite documents from the box are
//! flat and predictable, so elements are located by tag name rather than by
//! building a document tree. Nested elements with the same tag are not
//! supported.

/// One element occurrence: the raw attribute text and the raw inner text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Element<'a> {
    pub attrs: &'a str,
    pub inner: &'a str,
}

impl Element<'_> {
    /// Returns an unescaped attribute value.
    pub(crate) fn attribute(&self, name: &str) -> Option<String> {
        attribute(self.attrs, name)
    }

    /// Returns the unescaped, trimmed text of the first `tag` child, if non-empty.
    pub(crate) fn child_text(&self, tag: &str) -> Option<String> {
        first_text(self.inner, tag)
    }
}

/// Returns every `<tag ...>...</tag>` (or self-closing `<tag .../>`) in document order.
pub(crate) fn elements<'a>(xml: &'a str, tag: &str) -> Vec<Element<'a>> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut found = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find(&open) {
        let after_name = &rest[start + open.len()..];
        let Some(next) = after_name.chars().next() else {
            break;
        };
        // `<item` must not match `<itemCount`
        if !(next == '>' || next == '/' || next.is_whitespace()) {
            rest = after_name;
            continue;
        }
        let Some(tag_end) = after_name.find('>') else {
            break;
        };
        let head = &after_name[..tag_end];
        let body = &after_name[tag_end + 1..];

        if let Some(attrs) = head.strip_suffix('/') {
            found.push(Element {
                attrs: attrs.trim(),
                inner: "",
            });
            rest = body;
            continue;
        }

        let Some(close_at) = body.find(&close) else {
            break;
        };
        found.push(Element {
            attrs: head.trim(),
            inner: &body[..close_at],
        });
        rest = &body[close_at + close.len()..];
    }

    found
}

/// Returns the unescaped, trimmed text of the first `tag` element, if non-empty.
pub(crate) fn first_text(xml: &str, tag: &str) -> Option<String> {
    elements(xml, tag)
        .first()
        .map(|element| unescape(element.inner.trim()))
        .filter(|text| !text.is_empty())
}

/// Extracts a quoted attribute value from raw attribute text.
pub(crate) fn attribute(attrs: &str, name: &str) -> Option<String> {
    let mut rest = attrs;
    while let Some(pos) = rest.find(name) {
        let preceded_by_space = rest[..pos]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace);
        let after = rest[pos + name.len()..].trim_start();
        if preceded_by_space && let Some(value) = after.strip_prefix('=') {
            let value = value.trim_start();
            let quote = value.chars().next()?;
            if quote != '"' && quote != '\'' {
                return None;
            }
            let body = &value[1..];
            let end = body.find(quote)?;
            return Some(unescape(&body[..end]));
        }
        rest = &rest[pos + name.len()..];
    }
    None
}

/// Decodes the predefined XML entities and numeric character references.
///
/// Unknown or malformed references are kept verbatim.
pub(crate) fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Escapes text for use inside an element or attribute.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
