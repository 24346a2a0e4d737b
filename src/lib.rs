//! Fetch TV Core Library
//!
//! This library finds a Fetch TV set-top box on the local network, reads its
//! catalog of recordings, narrows it to what the user asked for and saves
//! the selected recordings to disk exactly once each.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`discovery`] - SSDP search and device descriptor parsing
//! - [`catalog`] - Directory/item model and the UPnP `ContentDirectory` adapter
//! - [`filter`] - Folder, title and live-status filtering
//! - [`download`] - HTTP client, live detection and the save pipeline
//! - [`registry`] - Durable record of recordings already saved
//! - [`report`] - JSON projections of listings and save results

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod discovery;
pub mod download;
pub mod filter;
pub mod registry;
pub mod report;
mod xml;

// Re-export commonly used types
pub use catalog::{CatalogError, CatalogSource, Directory, Item, UpnpCatalog, fetch_recordings};
pub use discovery::{DiscoveryOptions, MediaServer, discover};
pub use download::{
    DownloadError, DownloadOutcome, HttpClient, HttpTimeouts, LiveProbe, OutcomeKind, SaveEvent,
    SavePipeline, SaveReport,
};
pub use filter::{FilterCriteria, filter_recordings};
pub use registry::{RecordingRegistry, RegistryError, SavedFiles};
