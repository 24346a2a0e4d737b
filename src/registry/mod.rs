//! Durable record of recordings that have already been saved.
//!
//! The registry maps item id to title and lives beside the downloaded files
//! as a single JSON object. Every `put` rewrites the document through a temp
//! file, fsync and rename before returning, so the on-disk state is always a
//! complete document that never runs ahead of the finalized files.

mod error;

pub use error::RegistryError;

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Registry document name inside a save root.
pub const REGISTRY_FILENAME: &str = "fetchtv_save_list.json";

const TEMP_SUFFIX: &str = ".tmp";

/// Key-value persistence behind duplicate detection.
///
/// Implementations must make `put` durable before returning.
#[async_trait]
pub trait RecordingRegistry: Send {
    /// Opens (or creates) the registry for `root`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the store cannot be opened or read.
    async fn load(root: &Path) -> Result<Self, RegistryError>
    where
        Self: Sized;

    /// Returns true when `id` has been saved before.
    fn contains(&self, id: &str) -> bool;

    /// Records `id → title` and flushes it to stable storage.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the write does not reach disk. The
    /// entry stays in memory either way.
    async fn put(&mut self, id: &str, title: &str) -> Result<(), RegistryError>;
}

/// JSON-file registry bound to one save root.
#[derive(Debug, Clone)]
pub struct SavedFiles {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl SavedFiles {
    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Title recorded for `id`.
    #[must_use]
    pub fn title(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn persist(&self) -> Result<(), RegistryError> {
        let mut temp_name = self.path.as_os_str().to_os_string();
        temp_name.push(TEMP_SUFFIX);
        let temp_path = PathBuf::from(temp_name);

        let document = serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| RegistryError::serialize(&temp_path, e))?;
        let mut file = File::create(&temp_path)
            .await
            .map_err(|e| RegistryError::io(&temp_path, e))?;
        file.write_all(&document)
            .await
            .map_err(|e| RegistryError::io(&temp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| RegistryError::io(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| RegistryError::io(&self.path, e))?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "registry flushed");
        Ok(())
    }
}

#[async_trait]
impl RecordingRegistry for SavedFiles {
    #[instrument]
    async fn load(root: &Path) -> Result<Self, RegistryError> {
        fs::create_dir_all(root)
            .await
            .map_err(|e| RegistryError::io(root, e))?;
        let path = root.join(REGISTRY_FILENAME);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(RegistryError::io(&path, e)),
        };

        let registry = if content.trim().is_empty() {
            // a missing or blank document starts out as an empty mapping on disk
            let registry = Self {
                path,
                entries: BTreeMap::new(),
            };
            registry.persist().await?;
            registry
        } else {
            let entries =
                serde_json::from_str(&content).map_err(|e| RegistryError::parse(&path, e))?;
            Self { path, entries }
        };
        debug!(
            path = %registry.path.display(),
            entries = registry.entries.len(),
            "registry loaded"
        );

        Ok(registry)
    }

    fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    async fn put(&mut self, id: &str, title: &str) -> Result<(), RegistryError> {
        self.entries.insert(id.to_string(), title.to_string());
        self.persist().await
    }
}
