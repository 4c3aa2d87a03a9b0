//! External download accelerator (`aria2c`) driven as a subprocess.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, instrument};

use super::error::DownloadError;

/// An accelerator executable that was found on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accelerator {
    program: PathBuf,
}

impl Accelerator {
    /// Looks `program` up on `PATH` (or checks it directly when it is a path).
    ///
    /// Returns `None` when the executable is not available, which selects the
    /// built-in HTTP path.
    #[must_use]
    pub fn probe(program: &str) -> Option<Self> {
        match which::which(program) {
            Ok(resolved) => {
                debug!(program, resolved = %resolved.display(), "accelerator available");
                Some(Self { program: resolved })
            }
            Err(error) => {
                debug!(program, %error, "accelerator not available");
                None
            }
        }
    }

    /// Resolved executable path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the accelerator for one download.
    ///
    /// The accelerator continues an existing partial file, may overwrite it,
    /// skips pre-allocation, and writes directly to `partial`.
    #[must_use]
    pub fn command_args(url: &str, partial: &Path) -> Vec<OsString> {
        let dir = partial
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let out = partial.file_name().unwrap_or(partial.as_os_str());

        vec![
            "--continue=true".into(),
            "--allow-overwrite=true".into(),
            "--file-allocation=none".into(),
            "--dir".into(),
            dir.as_os_str().to_owned(),
            "--out".into(),
            out.to_owned(),
            url.into(),
        ]
    }

    /// Runs the accelerator to completion, writing into `partial`.
    ///
    /// Standard output and standard error are captured rather than inherited.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::AcceleratorSpawn`] when the process cannot be
    /// started and [`DownloadError::AcceleratorFailed`] (with exit code and
    /// stderr) when it exits unsuccessfully.
    #[instrument(skip(self, partial), fields(program = %self.program.display(), url = %url))]
    pub async fn fetch_to_partial(&self, url: &str, partial: &Path) -> Result<(), DownloadError> {
        let output = Command::new(&self.program)
            .args(Self::command_args(url, partial))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| DownloadError::AcceleratorSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DownloadError::accelerator_failed(
                self.display_name(),
                output.status.code(),
                &output.stderr,
            ));
        }

        info!(partial = %partial.display(), "accelerator finished");
        Ok(())
    }

    fn display_name(&self) -> String {
        self.program
            .file_name()
            .map_or_else(|| self.program.display().to_string(), |name| name.to_string_lossy().into_owned())
    }
}
