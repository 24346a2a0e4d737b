//! Serializable projections of catalog listings and save results.
//!
//! These are the payloads printed by `--json`; they carry no decision logic.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::catalog::{Directory, Item};
use crate::download::{DownloadOutcome, SaveRecord, SaveReport};

#[allow(clippy::expect_used)]
static EPISODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^S\d+ E\d+").expect("episode regex is valid"));

/// Whether an item looks like an episode of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Episode,
    Movie,
}

impl ItemKind {
    /// Episodes are titled `S<season> E<episode> ...`; anything else is a movie.
    #[must_use]
    pub fn of_title(title: &str) -> Self {
        if EPISODE_PATTERN.is_match(title) {
            Self::Episode
        } else {
            Self::Movie
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub duration: Option<String>,
    pub size: Option<u64>,
    pub description: Option<String>,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            kind: ItemKind::of_title(&item.title),
            duration: item.duration.clone(),
            size: item.size,
            description: item.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectorySummary {
    pub id: String,
    pub title: String,
    pub items: Vec<ItemSummary>,
}

impl From<&Directory> for DirectorySummary {
    fn from(directory: &Directory) -> Self {
        Self {
            id: directory.id.clone(),
            title: directory.title.clone(),
            items: directory.items.iter().map(ItemSummary::from).collect(),
        }
    }
}

/// One entry of the save payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveResultSummary {
    pub item: ItemSummary,
    pub recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SaveRecord> for SaveResultSummary {
    fn from(record: &SaveRecord) -> Self {
        Self {
            item: ItemSummary::from(&record.item),
            recorded: record.outcome.is_recorded(),
            warning: record.outcome.warning(),
            error: record.outcome.error().map(str::to_string),
        }
    }
}

/// Listing payload for a filtered catalog.
#[must_use]
pub fn summarize_directories(directories: &[Directory]) -> Vec<DirectorySummary> {
    directories.iter().map(DirectorySummary::from).collect()
}

/// Save payload for a run. Items skipped as already saved are left out.
#[must_use]
pub fn summarize_save(report: &SaveReport) -> Vec<SaveResultSummary> {
    report
        .records
        .iter()
        .filter(|record| record.outcome != DownloadOutcome::SkippedAlreadySaved)
        .map(SaveResultSummary::from)
        .collect()
}
