//! Resumable APK downloads.
//!
//! This module turns a download URL into a complete local file, either by
//! handing the transfer to an external accelerator or by streaming it with
//! the shared HTTP client.
//!
//! # Features
//!
//! - Streaming downloads (never buffers a whole body in memory)
//! - Resume from `<name>.partial` via HTTP range requests or accelerator continuation
//! - Atomic finalization: `<name>` only appears once the transfer succeeded
//! - Partial files survive failures so a later run can resume
//!
//! # Example
//!
//! ```no_run
//! use fdroid_downloader::config::ClientConfig;
//! use fdroid_downloader::download::{Downloader, HttpClient};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let downloader = Downloader::new(HttpClient::new(&config)?, None);
//! let file_path = downloader
//!     .download("https://f-droid.org/repo/org.fdroid.fdroid_1019050.apk", Path::new("./apks"))
//!     .await?;
//! println!("Downloaded: {}", file_path.display());
//! # Ok(())
//! # }
//! ```

mod accelerator;
mod client;
pub mod constants;
mod engine;
mod error;
mod target;

pub use accelerator::Accelerator;
pub use client::{FetchOutcome, HttpClient};
pub use engine::{Downloader, FetchStrategy};
pub use error::DownloadError;
pub use target::DownloadTarget;

