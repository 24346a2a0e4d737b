//! Narrowing the recording catalog to what the user asked for.
//!
//! Folder and title terms are case-insensitive substring matches on trimmed
//! terms. An empty include list matches everything and exclude terms always
//! win. Directory and item order is preserved.

use tracing::{debug, instrument, warn};

use crate::catalog::{Directory, Item};
use crate::download::LiveProbe;

/// Match criteria applied by [`filter_recordings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Keep only folders whose title contains one of these terms.
    pub folder_include: Vec<String>,
    /// Drop folders whose title contains any of these terms.
    pub folder_exclude: Vec<String>,
    /// Keep only items whose title contains one of these terms.
    pub title_include: Vec<String>,
    /// Return folders only, with empty item lists.
    pub shows_only: bool,
    /// Keep only items that are currently being recorded.
    pub live_only: bool,
}

impl FilterCriteria {
    /// True when no criterion narrows anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folder_include.is_empty()
            && self.folder_exclude.is_empty()
            && self.title_include.is_empty()
            && !self.shows_only
            && !self.live_only
    }
}

/// Applies `criteria` to `directories`.
///
/// With `live_only` every surviving item is probed once through `probe`;
/// items that are not live, or whose probe fails, are dropped together with
/// folders left empty. `live_only` takes precedence over `shows_only`. With
/// `shows_only` alone the probe is never called.
#[instrument(skip_all, fields(directories = directories.len()))]
pub async fn filter_recordings<P>(
    directories: Vec<Directory>,
    criteria: &FilterCriteria,
    probe: &P,
) -> Vec<Directory>
where
    P: LiveProbe + ?Sized,
{
    if criteria.is_empty() {
        debug!("no filter criteria, keeping the full catalog");
        return directories;
    }

    let folder_include = normalize_terms(&criteria.folder_include);
    let folder_exclude = normalize_terms(&criteria.folder_exclude);
    let title_include = normalize_terms(&criteria.title_include);
    let shows_only = criteria.shows_only && !criteria.live_only;

    let mut selected = Vec::new();
    for mut directory in directories {
        if !folder_matches(&directory.title, &folder_include, &folder_exclude) {
            continue;
        }

        if shows_only {
            directory.items.clear();
            selected.push(directory);
            continue;
        }

        directory
            .items
            .retain(|item| title_include.is_empty() || contains_any(&item.title, &title_include));

        if criteria.live_only {
            directory.items = live_items(directory.items, probe).await;
            if directory.items.is_empty() {
                continue;
            }
        }
        selected.push(directory);
    }

    debug!(selected = selected.len(), "catalog filtered");
    selected
}

async fn live_items<P>(items: Vec<Item>, probe: &P) -> Vec<Item>
where
    P: LiveProbe + ?Sized,
{
    let mut live = Vec::with_capacity(items.len());
    for item in items {
        match probe.is_recording(&item).await {
            Ok(true) => live.push(item),
            Ok(false) => {}
            Err(error) => {
                warn!(item_id = %item.id, %error, "live probe failed, treating as not recording");
            }
        }
    }
    live
}

/// Trims and lowercases terms. Blank terms are dropped, so `--exclude ""`
/// excludes nothing.
fn normalize_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

fn contains_any(title: &str, terms: &[String]) -> bool {
    let title = title.to_lowercase();
    terms.iter().any(|term| title.contains(term.as_str()))
}

fn folder_matches(title: &str, include: &[String], exclude: &[String]) -> bool {
    if contains_any(title, exclude) {
        return false;
    }
    include.is_empty() || contains_any(title, include)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::download::DownloadError;

    /// Probe that answers from a fixed set of live ids and counts calls.
    #[derive(Default)]
    struct FakeProbe {
        live: HashSet<String>,
        failing: HashSet<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LiveProbe for FakeProbe {
        async fn is_recording(&self, item: &Item) -> Result<bool, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&item.id) {
                return Err(DownloadError::timeout(&item.url));
            }
            Ok(self.live.contains(&item.id))
        }
    }

    fn catalog() -> Vec<Directory> {
        vec![
            Directory {
                id: "1".to_string(),
                title: "Drama".to_string(),
                items: vec![
                    Item::new("11", "S01 E01 Arrival", "http://box/11"),
                    Item::new("12", "S01 E02 Pilot", "http://box/12"),
                ],
            },
            Directory {
                id: "2".to_string(),
                title: "News at Six".to_string(),
                items: vec![Item::new("21", "Evening News", "http://box/21")],
            },
            Directory {
                id: "3".to_string(),
                title: "Movies".to_string(),
                items: vec![Item::new("31", "The Long Night", "http://box/31")],
            },
        ]
    }

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn titles(directories: &[Directory]) -> Vec<&str> {
        directories.iter().map(|d| d.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_empty_criteria_returns_input_unchanged() {
        let probe = FakeProbe::default();
        let result = filter_recordings(catalog(), &FilterCriteria::default(), &probe).await;
        assert_eq!(result, catalog());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_folder_include_is_case_insensitive_and_trimmed() {
        let criteria = FilterCriteria {
            folder_include: terms(&["  news "]),
            ..FilterCriteria::default()
        };
        let result = filter_recordings(catalog(), &criteria, &FakeProbe::default()).await;
        assert_eq!(titles(&result), vec!["News at Six"]);
    }

    #[tokio::test]
    async fn test_exclude_wins_over_include() {
        let criteria = FilterCriteria {
            folder_include: terms(&["drama", "news"]),
            folder_exclude: terms(&["NEWS"]),
            ..FilterCriteria::default()
        };
        let result = filter_recordings(catalog(), &criteria, &FakeProbe::default()).await;
        assert_eq!(titles(&result), vec!["Drama"]);
    }

    #[tokio::test]
    async fn test_title_include_keeps_empty_directories() {
        let criteria = FilterCriteria {
            title_include: terms(&["pilot"]),
            ..FilterCriteria::default()
        };
        let result = filter_recordings(catalog(), &criteria, &FakeProbe::default()).await;
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].items.len(), 1);
        assert_eq!(result[0].items[0].id, "12");
        assert!(result[1].items.is_empty());
    }

    #[tokio::test]
    async fn test_shows_only_never_probes() {
        let probe = FakeProbe::default();
        let criteria = FilterCriteria {
            shows_only: true,
            ..FilterCriteria::default()
        };
        let result = filter_recordings(catalog(), &criteria, &probe).await;
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|d| d.items.is_empty()));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_only_drops_idle_items_and_empty_folders() {
        let probe = FakeProbe {
            live: ["12".to_string()].into_iter().collect(),
            failing: ["21".to_string()].into_iter().collect(),
            ..FakeProbe::default()
        };
        let criteria = FilterCriteria {
            live_only: true,
            shows_only: true,
            ..FilterCriteria::default()
        };
        let result = filter_recordings(catalog(), &criteria, &probe).await;

        assert_eq!(titles(&result), vec!["Drama"]);
        assert_eq!(result[0].items.len(), 1);
        assert_eq!(result[0].items[0].id, "12");
        assert_eq!(probe.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_live_only_probes_after_title_filter() {
        let probe = FakeProbe::default();
        let criteria = FilterCriteria {
            title_include: terms(&["arrival"]),
            live_only: true,
            ..FilterCriteria::default()
        };
        let result = filter_recordings(catalog(), &criteria, &probe).await;
        assert!(result.is_empty());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_terms_match_nothing() {
        let criteria = FilterCriteria {
            folder_include: terms(&["", "  "]),
            folder_exclude: terms(&[""]),
            title_include: terms(&["\t"]),
            ..FilterCriteria::default()
        };
        assert!(!criteria.is_empty());
        let result = filter_recordings(catalog(), &criteria, &FakeProbe::default()).await;
        assert_eq!(result, catalog());
    }

    #[test]
    fn test_criteria_is_empty() {
        assert!(FilterCriteria::default().is_empty());
        let criteria = FilterCriteria {
            folder_exclude: terms(&["x"]),
            ..FilterCriteria::default()
        };
        assert!(!criteria.is_empty());
    }
}
