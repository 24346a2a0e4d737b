//! Recording catalog model and the source abstraction it is read through.
//!
//! The box exposes its recordings as a tree of folders (one per show) that
//! each hold the recorded items. Everything downstream of this module works
//! on [`Directory`] and [`Item`] values and never talks UPnP directly.
//!
//! # Architecture
//!
//! - [`CatalogSource`] - Async trait for "list directories under a parent id"
//! - [`UpnpCatalog`] - `ContentDirectory` implementation backed by SOAP `Browse`
//! - [`fetch_recordings`] - Locates the `Recordings` folder and lists its shows

mod didl;
mod error;
mod upnp;

pub use error::CatalogError;
pub use upnp::UpnpCatalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Title of the top-level folder that holds recorded shows.
pub const RECORDINGS_FOLDER_TITLE: &str = "Recordings";

/// A folder in the catalog, usually one show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    /// Object id, unique within one discovery session.
    pub id: String,
    /// Folder title as shown on the box.
    pub title: String,
    /// Recorded items in catalog order.
    pub items: Vec<Item>,
}

/// A single recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Object id, used as the registry key.
    pub id: String,
    /// Recording title, e.g. `S01 E02 Pilot`.
    pub title: String,
    /// Direct media stream endpoint.
    pub url: String,
    /// Reported duration (`H:MM:SS.mmm`), if any.
    pub duration: Option<String>,
    /// Reported size in bytes. Unreliable while the item is still recording.
    pub size: Option<u64>,
    /// Programme description, if any.
    pub description: Option<String>,
}

impl Directory {
    /// Creates a directory with no items.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            items: Vec::new(),
        }
    }
}

impl Item {
    /// Creates an item with no optional metadata.
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            duration: None,
            size: None,
            description: None,
        }
    }
}

/// Read access to the catalog tree.
///
/// Implementations return directories in the order the box reports them,
/// each already populated with its items.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Lists the directories directly below `parent_id` (the root when `None`).
    async fn list_directories(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<Directory>, CatalogError>;
}

/// Returns every show folder below the `Recordings` folder.
///
/// A box without a `Recordings` folder yields an empty catalog rather than
/// an error.
///
/// # Errors
///
/// Propagates [`CatalogError`] from the source.
#[instrument(skip(source))]
pub async fn fetch_recordings(source: &dyn CatalogSource) -> Result<Vec<Directory>, CatalogError> {
    let base_folders = source.list_directories(None).await?;
    let Some(recordings) = base_folders
        .iter()
        .find(|folder| folder.title == RECORDINGS_FOLDER_TITLE)
    else {
        info!("no Recordings folder found on the server");
        return Ok(Vec::new());
    };

    let shows = source.list_directories(Some(&recordings.id)).await?;
    debug!(
        folder_id = %recordings.id,
        shows = shows.len(),
        "listed recording folders"
    );
    Ok(shows)
}
