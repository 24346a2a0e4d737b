//! Save pipeline: downloads selected recordings exactly once each.
//!
//! # Overview
//!
//! [`SavePipeline`] walks the filtered catalog show by show, item by item,
//! and decides for each item whether to skip it or transfer it. A transfer
//! streams the body into `<path>.lock`, which doubles as the lock marker and
//! is created with exclusive-create semantics, then renames it onto the
//! final path and records the item in the registry before moving on.
//!
//! Every decision is reported as a [`DownloadOutcome`]; nothing in here
//! returns early with an error for a single item.
//!
//! # Example
//!
//! ```no_run
//! use fetchtv_core::download::{HttpClient, SavePipeline};
//! use fetchtv_core::catalog::Directory;
//!
//! # async fn example(shows: Vec<Directory>) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = SavePipeline::new(HttpClient::new(), "./recordings");
//! let report = pipeline.save_all(&shows).await?;
//! println!("saved {}", report.recorded_count());
//! # Ok(())
//! # }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

use super::HttpClient;
use super::error::DownloadError;
use super::filename::{lock_path, recording_path};
use super::transfer::{TransferError, stream_to_file};
use crate::catalog::{Directory, Item};
use crate::registry::{RecordingRegistry, RegistryError, SavedFiles};

/// Result of trying to save one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Transferred in full, renamed into place and registered.
    Completed { path: PathBuf, bytes_written: u64 },
    /// Already in the registry and overwrite is off.
    SkippedAlreadySaved,
    /// A lock marker exists, another writer holds it or a previous run died.
    SkippedLocked { lock_path: PathBuf },
    /// The item is still being recorded.
    SkippedLive,
    /// Saved with a warning: the body ended short of the declared length,
    /// which the box overstates. Renamed into place and registered.
    CompletedShort {
        path: PathBuf,
        bytes_written: u64,
        expected_bytes: u64,
    },
    /// Request, filesystem or registry failure. Any lock marker is left behind.
    FailedIo { error: String },
}

/// Discriminant of [`DownloadOutcome`] for events and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Completed,
    SkippedAlreadySaved,
    SkippedLocked,
    SkippedLive,
    CompletedShort,
    FailedIo,
}

impl DownloadOutcome {
    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Completed { .. } => OutcomeKind::Completed,
            Self::SkippedAlreadySaved => OutcomeKind::SkippedAlreadySaved,
            Self::SkippedLocked { .. } => OutcomeKind::SkippedLocked,
            Self::SkippedLive => OutcomeKind::SkippedLive,
            Self::CompletedShort { .. } => OutcomeKind::CompletedShort,
            Self::FailedIo { .. } => OutcomeKind::FailedIo,
        }
    }

    /// True when the file now exists at its final path and is registered.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::CompletedShort { .. })
    }

    /// Informational message for skipped or tolerated outcomes.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::SkippedAlreadySaved => Some("Already saved, skipping".to_string()),
            Self::SkippedLocked { .. } => {
                Some("Already writing (lock file exists) skipping".to_string())
            }
            Self::SkippedLive => Some("Skipping item it's currently recording".to_string()),
            Self::CompletedShort {
                bytes_written,
                expected_bytes,
                ..
            } => Some(format!(
                "Final read was short ({bytes_written} of {expected_bytes} bytes); \
                 the server sets the wrong Content-Length header. File should be fine"
            )),
            Self::Completed { .. } | Self::FailedIo { .. } => None,
        }
    }

    /// Error message for failed outcomes.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::FailedIo { error } => Some(error),
            _ => None,
        }
    }

    fn failed_io(error: impl std::fmt::Display) -> Self {
        Self::FailedIo {
            error: error.to_string(),
        }
    }
}

/// One processed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRecord {
    /// Title of the show folder the item came from.
    pub show_title: String,
    pub item: Item,
    pub outcome: DownloadOutcome,
}

/// Everything a save run did, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub records: Vec<SaveRecord>,
    /// True when no item needed a download (all were already saved).
    pub nothing_new: bool,
}

impl SaveReport {
    /// Number of records with the given outcome.
    #[must_use]
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome.kind() == kind)
            .count()
    }

    /// Number of items now saved on disk.
    #[must_use]
    pub fn recorded_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome.is_recorded())
            .count()
    }

    /// True when any item failed outright.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.count(OutcomeKind::FailedIo) > 0
    }
}

/// Progress and status events for a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveEvent {
    /// An item passed the registry check and is about to be fetched.
    ItemStarted {
        item_id: String,
        title: String,
        path: PathBuf,
    },
    /// Body bytes written so far for the item being transferred.
    Progress {
        item_id: String,
        bytes_written: u64,
        expected_bytes: Option<u64>,
    },
    /// Final outcome of an item with its message, if any.
    ItemFinished {
        item_id: String,
        title: String,
        kind: OutcomeKind,
        message: Option<String>,
    },
    /// The run found nothing new to save.
    NothingNew,
}

/// Sequential save pipeline bound to one save root.
#[derive(Debug, Clone)]
pub struct SavePipeline {
    client: HttpClient,
    root: PathBuf,
    overwrite: bool,
    events: Option<UnboundedSender<SaveEvent>>,
}

impl SavePipeline {
    /// Creates a pipeline that saves below `root`.
    pub fn new(client: HttpClient, root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            root: root.into(),
            overwrite: false,
            events: None,
        }
    }

    /// Re-download items that are already registered.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sends [`SaveEvent`]s to `sender` while running.
    #[must_use]
    pub fn with_events(mut self, sender: UnboundedSender<SaveEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads the JSON registry of the save root and runs over `shows`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the registry cannot be loaded. No item
    /// is processed in that case.
    pub async fn save_all(&self, shows: &[Directory]) -> Result<SaveReport, RegistryError> {
        let mut registry = SavedFiles::load(&self.root).await?;
        Ok(self.run(&mut registry, shows).await)
    }

    /// Processes every item of every show in order.
    #[instrument(skip_all, fields(root = %self.root.display(), overwrite = self.overwrite))]
    pub async fn run<R>(&self, registry: &mut R, shows: &[Directory]) -> SaveReport
    where
        R: RecordingRegistry + ?Sized,
    {
        let mut report = SaveReport::default();
        for show in shows {
            for item in &show.items {
                let outcome = self.save_item(registry, show, item).await;
                report.records.push(SaveRecord {
                    show_title: show.title.clone(),
                    item: item.clone(),
                    outcome,
                });
            }
        }

        report.nothing_new = report.count(OutcomeKind::SkippedAlreadySaved) == report.records.len();
        if report.nothing_new {
            info!("There is nothing new to record");
            self.emit(SaveEvent::NothingNew);
        } else {
            info!(
                completed = report.count(OutcomeKind::Completed),
                short_reads = report.count(OutcomeKind::CompletedShort),
                locked = report.count(OutcomeKind::SkippedLocked),
                live = report.count(OutcomeKind::SkippedLive),
                failed = report.count(OutcomeKind::FailedIo),
                already_saved = report.count(OutcomeKind::SkippedAlreadySaved),
                "save run finished"
            );
        }
        report
    }

    /// Saves a single item of `show`.
    #[instrument(
        skip(self, registry, show, item),
        fields(show = %show.title, item_id = %item.id, title = %item.title)
    )]
    pub async fn save_item<R>(
        &self,
        registry: &mut R,
        show: &Directory,
        item: &Item,
    ) -> DownloadOutcome
    where
        R: RecordingRegistry + ?Sized,
    {
        let outcome = if !self.overwrite && registry.contains(&item.id) {
            debug!("already saved");
            DownloadOutcome::SkippedAlreadySaved
        } else {
            let path = recording_path(&self.root, show, item);
            info!(path = %path.display(), "Writing recording");
            self.emit(SaveEvent::ItemStarted {
                item_id: item.id.clone(),
                title: item.title.clone(),
                path: path.clone(),
            });
            self.transfer(registry, item, path).await
        };

        match &outcome {
            DownloadOutcome::FailedIo { error } => warn!(%error, "save failed"),
            DownloadOutcome::CompletedShort { .. } | DownloadOutcome::SkippedLocked { .. } => {
                warn!(detail = %outcome.warning().unwrap_or_default(), "save incomplete");
            }
            _ => debug!(outcome = ?outcome.kind(), "item processed"),
        }
        self.emit(SaveEvent::ItemFinished {
            item_id: item.id.clone(),
            title: item.title.clone(),
            kind: outcome.kind(),
            message: outcome
                .error()
                .map(str::to_string)
                .or_else(|| outcome.warning()),
        });
        outcome
    }

    async fn transfer<R>(&self, registry: &mut R, item: &Item, path: PathBuf) -> DownloadOutcome
    where
        R: RecordingRegistry + ?Sized,
    {
        let lock = lock_path(&path);

        // Fast path only; the exclusive create below is what actually decides.
        match tokio::fs::try_exists(&lock).await {
            Ok(true) => return DownloadOutcome::SkippedLocked { lock_path: lock },
            Ok(false) => {}
            Err(e) => return DownloadOutcome::failed_io(DownloadError::io(&lock, e)),
        }

        if let Some(show_dir) = path.parent()
            && let Err(e) = tokio::fs::create_dir_all(show_dir).await
        {
            return DownloadOutcome::failed_io(DownloadError::io(show_dir, e));
        }

        let media = match self.client.open_media(&item.url).await {
            Ok(media) => media,
            Err(e) => return DownloadOutcome::failed_io(e),
        };
        if media.is_live() {
            return DownloadOutcome::SkippedLive;
        }
        let expected_bytes = media.content_length();

        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(lock = %lock.display(), "lost the race for the lock marker");
                return DownloadOutcome::SkippedLocked { lock_path: lock };
            }
            Err(e) => return DownloadOutcome::failed_io(DownloadError::io(&lock, e)),
        };

        let progress = |bytes_written| {
            self.emit(SaveEvent::Progress {
                item_id: item.id.clone(),
                bytes_written,
                expected_bytes,
            });
        };
        let (bytes_written, short_of) = match stream_to_file(file, media, &lock, progress).await {
            Ok(bytes_written) => (bytes_written, None),
            Err(TransferError::ShortRead {
                bytes_written,
                expected_bytes,
            }) => (bytes_written, Some(expected_bytes)),
            Err(TransferError::Failed(e)) => {
                warn!(lock = %lock.display(), "transfer failed, leaving lock marker in place");
                return DownloadOutcome::failed_io(format!("Error writing file: {e}"));
            }
        };

        if let Err(e) = tokio::fs::rename(&lock, &path).await {
            return DownloadOutcome::failed_io(DownloadError::io(&path, e));
        }
        if let Err(e) = registry.put(&item.id, &item.title).await {
            return DownloadOutcome::failed_io(format!(
                "Saved {} but failed to update registry: {e}",
                path.display()
            ));
        }

        match short_of {
            None => DownloadOutcome::Completed {
                path,
                bytes_written,
            },
            Some(expected_bytes) => DownloadOutcome::CompletedShort {
                path,
                bytes_written,
                expected_bytes,
            },
        }
    }

    fn emit(&self, event: SaveEvent) {
        if let Some(sender) = &self.events {
            // a dropped receiver only means nobody is rendering
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;

    use super::*;

    /// In-memory registry that records every write.
    #[derive(Default)]
    struct MemoryRegistry {
        ids: HashSet<String>,
        puts: Vec<(String, String)>,
    }

    #[async_trait]
    impl RecordingRegistry for MemoryRegistry {
        async fn load(_root: &Path) -> Result<Self, RegistryError> {
            Ok(Self::default())
        }

        fn contains(&self, id: &str) -> bool {
            self.ids.contains(id)
        }

        async fn put(&mut self, id: &str, title: &str) -> Result<(), RegistryError> {
            self.ids.insert(id.to_string());
            self.puts.push((id.to_string(), title.to_string()));
            Ok(())
        }
    }

    fn show(title: &str, items: Vec<Item>) -> Directory {
        Directory {
            id: format!("show-{title}"),
            title: title.to_string(),
            items,
        }
    }

    #[test]
    fn test_outcome_recorded_flags() {
        let completed = DownloadOutcome::Completed {
            path: PathBuf::from("a"),
            bytes_written: 1,
        };
        let short = DownloadOutcome::CompletedShort {
            path: PathBuf::from("a"),
            bytes_written: 1,
            expected_bytes: 2,
        };
        assert!(completed.is_recorded());
        assert!(short.is_recorded());
        assert!(short.warning().unwrap().contains("1 of 2 bytes"));
        assert!(!DownloadOutcome::SkippedLive.is_recorded());
        assert!(!DownloadOutcome::failed_io("boom").is_recorded());
        assert_eq!(DownloadOutcome::failed_io("boom").error(), Some("boom"));
    }

    #[tokio::test]
    async fn test_already_saved_items_touch_nothing() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        let mut registry = MemoryRegistry::default();
        registry.ids.insert("42".to_string());

        let pipeline = SavePipeline::new(HttpClient::new(), &root);
        let shows = vec![show("Drama", vec![Item::new("42", "Pilot", "http://unused/42")])];
        let report = pipeline.run(&mut registry, &shows).await;

        assert!(report.nothing_new);
        assert_eq!(report.records[0].outcome, DownloadOutcome::SkippedAlreadySaved);
        assert!(registry.puts.is_empty());
        assert!(!root.exists(), "no directories may be created");
    }

    #[tokio::test]
    async fn test_empty_catalog_reports_nothing_new() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut registry = MemoryRegistry::default();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let pipeline = SavePipeline::new(HttpClient::new(), temp_dir.path()).with_events(tx);

        let report = pipeline.run(&mut registry, &[show("Empty", Vec::new())]).await;

        assert!(report.nothing_new);
        assert_eq!(rx.recv().await, Some(SaveEvent::NothingNew));
    }

    #[tokio::test]
    async fn test_existing_lock_marker_is_left_untouched() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let item = Item::new("7", "S01 E02 Pilot", "http://127.0.0.1:9/never");
        let drama = show("Drama", Vec::new());
        let path = recording_path(temp_dir.path(), &drama, &item);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let lock = lock_path(&path);
        std::fs::write(&lock, b"partial").unwrap();

        let mut registry = MemoryRegistry::default();
        let pipeline = SavePipeline::new(HttpClient::new(), temp_dir.path());
        let outcome = pipeline.save_item(&mut registry, &drama, &item).await;

        assert_eq!(outcome, DownloadOutcome::SkippedLocked { lock_path: lock.clone() });
        assert_eq!(std::fs::read(&lock).unwrap(), b"partial");
        assert!(!path.exists());
        assert!(registry.puts.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_bypasses_registry_check() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut registry = MemoryRegistry::default();
        registry.ids.insert("42".to_string());
        let pipeline = SavePipeline::new(HttpClient::new(), temp_dir.path()).overwrite(true);

        let outcome = pipeline
            .save_item(
                &mut registry,
                &show("Drama", Vec::new()),
                &Item::new("42", "Pilot", "not-a-url"),
            )
            .await;

        assert_eq!(outcome.kind(), OutcomeKind::FailedIo);
        assert!(outcome.error().unwrap().contains("invalid URL"));
    }
}
