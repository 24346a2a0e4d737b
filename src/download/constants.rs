//! Constants for the download module (timeouts, file layout, server quirks).

/// Default HTTP connect timeout.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default idle read timeout while streaming a recording body.
pub const READ_TIMEOUT_SECS: u64 = 60;

/// Default time allowed for response headers (probes, SOAP, descriptors).
pub const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Content-Length the box reports for a recording that is still growing.
pub const LIVE_RECORDING_LENGTH: u64 = 4_398_046_510_080;

/// Write buffer size used while streaming a body to disk.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Suffix of the lock marker (and in-progress file) next to a recording.
pub const LOCK_SUFFIX: &str = ".lock";

/// Extension given to saved recordings.
pub const MEDIA_EXTENSION: &str = ".mpeg";

/// Maximum length in bytes of a sanitized path component.
pub const MAX_FILENAME_BYTES: usize = 255;
