//! Saving recordings from the box to disk.
//!
//! This module provides the HTTP client used for every request to the box
//! plus the save pipeline that streams recordings into `<root>/<show>/`.
//!
//! # Features
//!
//! - Streaming transfers through a lock file with exclusive-create semantics
//! - Still-recording detection from the `Content-Length` sentinel
//! - Tolerance for the short final read the box produces
//! - Bounded header waits and idle-read timeouts
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use fetchtv_core::download::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let media = client.open_media("http://192.168.1.10:49152/web/2.mpeg").await?;
//! println!("live: {}", media.is_live());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
pub mod filename;
mod live;
mod pipeline;
mod transfer;

pub use client::{HttpClient, HttpTimeouts, MediaResponse, is_live_length};
pub use error::DownloadError;
pub use live::LiveProbe;
pub use pipeline::{
    DownloadOutcome, OutcomeKind, SaveEvent, SavePipeline, SaveRecord, SaveReport,
};
