//! Filename sanitization and path layout for saved recordings.
//!
//! Recordings land at `<root>/<show>/<title>.mpeg`, with the in-progress file
//! and lock marker at the same path plus `.lock`.

use std::path::{Component, Path, PathBuf};

use super::constants::{LOCK_SUFFIX, MAX_FILENAME_BYTES, MEDIA_EXTENSION};
use crate::catalog::{Directory, Item};

/// Characters removed outright from path components.
const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Used when neither a title nor an id yields a usable component.
const PLACEHOLDER_COMPONENT: &str = "_";

/// Sanitizes one path component.
///
/// Trims surrounding whitespace, deletes `< > : " / \ | ? *`, turns every
/// tab and space into `_` and keeps at most 255 bytes, cut on a character
/// boundary.
#[must_use]
pub fn sanitize_component(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c == ' ' || c == '\t' { '_' } else { c })
        .collect();
    truncate_to_bytes(&sanitized, MAX_FILENAME_BYTES).to_string()
}

/// Final path of `item` saved under `show` in `root`.
///
/// The show becomes a single directory below `root`; a show title that
/// sanitizes to nothing, `.` or `..` is replaced by the folder id. The title
/// stem is shortened further so that the name still fits once the media
/// extension and lock suffix are appended. An item whose title sanitizes to
/// nothing is named after its id.
#[must_use]
pub fn recording_path(root: &Path, show: &Directory, item: &Item) -> PathBuf {
    let show_dir =
        first_usable_component(&[show.title.as_str(), show.id.as_str()], MAX_FILENAME_BYTES);
    let max_stem = MAX_FILENAME_BYTES - MEDIA_EXTENSION.len() - LOCK_SUFFIX.len();
    let stem = first_usable_component(&[item.title.as_str(), item.id.as_str()], max_stem);

    root.join(show_dir).join(format!("{stem}{MEDIA_EXTENSION}"))
}

/// Lock marker path guarding `path`.
#[must_use]
pub fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}

fn first_usable_component(candidates: &[&str], max_bytes: usize) -> String {
    candidates
        .iter()
        .map(|candidate| truncate_to_bytes(&sanitize_component(candidate), max_bytes).to_string())
        .find(|component| is_plain_component(component))
        .unwrap_or_else(|| PLACEHOLDER_COMPONENT.to_string())
}

/// True when `name` joins as exactly one normal path component.
fn is_plain_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn truncate_to_bytes(name: &str, max_bytes: usize) -> &str {
    if name.len() <= max_bytes {
        return name;
    }
    let mut end = max_bytes;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}
