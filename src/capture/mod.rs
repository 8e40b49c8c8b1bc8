/// Screen region capture
///
/// The actual region selection is done by an external screenshot tool that
/// lets the user drag a rectangle and writes it to a file. A cancelled
/// selection, a tool failure and a missing output file are all the same
/// thing to the caller: no image, nothing to translate.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::CaptureError;

const GNOME_SCREENSHOT: &str = "gnome-screenshot";

/// A raw captured region on disk
///
/// Owned by one pipeline run and discarded once it has been preprocessed.
#[derive(Debug)]
pub struct CapturedImage {
    path: PathBuf,
}

impl CapturedImage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Anything that can interactively capture a screen region into `output`
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    async fn capture(&self, output: &Path) -> Result<CapturedImage, CaptureError>;
}

/// Area selection through `gnome-screenshot -a -f <path>`
#[derive(Debug, Clone)]
pub struct GnomeScreenshot {
    program: String,
}

impl Default for GnomeScreenshot {
    fn default() -> Self {
        Self {
            program: GNOME_SCREENSHOT.to_string(),
        }
    }
}

impl GnomeScreenshot {
    #[cfg(test)]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl ScreenCapture for GnomeScreenshot {
    async fn capture(&self, output: &Path) -> Result<CapturedImage, CaptureError> {
        // A stale file from an earlier run must not be mistaken for a new capture
        let _ = tokio::fs::remove_file(output).await;

        debug!(path = %output.display(), "Waiting for region selection");

        let status = tokio::process::Command::new(&self.program)
            .arg("-a")
            .arg("-f")
            .arg(output)
            .status()
            .await
            .map_err(|source| CaptureError::Launch {
                tool: GNOME_SCREENSHOT,
                source,
            })?;

        if !status.success() {
            return Err(CaptureError::Cancelled {
                tool: GNOME_SCREENSHOT,
                status,
            });
        }

        ensure_written(output).await
    }
}

/// The tool may exit cleanly without writing anything (e.g. Esc on some versions)
pub async fn ensure_written(output: &Path) -> Result<CapturedImage, CaptureError> {
    match tokio::fs::try_exists(output).await {
        Ok(true) => Ok(CapturedImage::new(output.to_path_buf())),
        _ => Err(CaptureError::MissingOutput(output.to_path_buf())),
    }
}
