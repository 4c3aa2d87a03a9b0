//! Constants for the download module (timeouts, chunking, partial files).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default total timeout for search and package detail pages (30 seconds).
pub const METADATA_TIMEOUT_SECS: u64 = 30;

/// Default idle read timeout while streaming an APK body (60 seconds).
pub const DOWNLOAD_READ_TIMEOUT_SECS: u64 = 60;

/// Write granularity for streamed bodies (128 KiB).
pub const CHUNK_SIZE: usize = 128 * 1024;

/// Suffix appended to the final file name while a download is in flight.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// External accelerator looked up on `PATH` when none is configured.
pub const DEFAULT_ACCELERATOR: &str = "aria2c";
