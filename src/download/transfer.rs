//! Streaming a media body into the lock file.

use std::path::Path;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use super::client::MediaResponse;
use super::constants::CHUNK_SIZE;
use super::error::DownloadError;

/// Why a body transfer stopped early.
#[derive(Debug)]
pub(crate) enum TransferError {
    /// The body ended before the declared length after some data arrived.
    ///
    /// The box overstates Content-Length at the end of a recording, so this
    /// is treated as a complete file.
    ShortRead {
        bytes_written: u64,
        expected_bytes: u64,
    },
    /// Any other network or disk failure.
    Failed(DownloadError),
}

/// Streams `media` into `file`, flushing through an 8 KiB buffer.
///
/// `on_progress` receives the running byte count after every chunk. The
/// data is synced to disk before success is reported.
pub(crate) async fn stream_to_file<F>(
    file: File,
    media: MediaResponse,
    file_path: &Path,
    mut on_progress: F,
) -> Result<u64, TransferError>
where
    F: FnMut(u64),
{
    let expected = media.content_length();
    let url = media.url().to_string();
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut stream = media.into_response().bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = match chunk_result {
            Ok(chunk) => chunk,
            Err(error) => {
                // keep what arrived so a short final read leaves a usable file
                writer
                    .flush()
                    .await
                    .map_err(|e| TransferError::Failed(DownloadError::io(file_path, e)))?;
                if is_short_read(&error, bytes_written, expected) {
                    debug!(bytes_written, ?expected, error = %error, "body ended short");
                    return Err(TransferError::ShortRead {
                        bytes_written,
                        expected_bytes: expected.unwrap_or(bytes_written),
                    });
                }
                return Err(TransferError::Failed(DownloadError::network(url, error)));
            }
        };

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| TransferError::Failed(DownloadError::io(file_path, e)))?;
        bytes_written += chunk.len() as u64;
        on_progress(bytes_written);
    }

    writer
        .flush()
        .await
        .map_err(|e| TransferError::Failed(DownloadError::io(file_path, e)))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|e| TransferError::Failed(DownloadError::io(file_path, e)))?;

    Ok(bytes_written)
}

/// Recognises the box's short final read: a body error that is not a
/// timeout, after at least one byte, short of the declared length.
fn is_short_read(error: &reqwest::Error, bytes_written: u64, expected: Option<u64>) -> bool {
    !error.is_timeout()
        && (error.is_body() || error.is_decode())
        && is_short_of_declared(bytes_written, expected)
}

fn is_short_of_declared(bytes_written: u64, expected: Option<u64>) -> bool {
    bytes_written > 0 && expected.is_some_and(|expected| bytes_written < expected)
}
