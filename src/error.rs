/// Error types for each stage of a capture cycle
///
/// Every error here stops at a well-defined boundary: provider errors are
/// absorbed by the provider itself, everything else is turned into a
/// `CycleOutcome` by the pipeline before it reaches the UI.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// The screenshot tool did not produce an image
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status} (selection cancelled?)")]
    Cancelled { tool: &'static str, status: ExitStatus },

    #[error("no image was written to {0}")]
    MissingOutput(PathBuf),
}

/// The captured image could not be read or the processed image not written
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("preprocessing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The OCR engine could not be run
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },
}

/// A translation backend call failed
///
/// Never leaves the provider: `Translator::translate` turns it into a
/// degraded `TranslationResult`.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("no credential configured ({0} is not set)")]
    MissingCredential(&'static str),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response shape: {0}")]
    MalformedResponse(String),
}

/// Startup configuration could not be built
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Why the monitor scale fell back to its default
#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("home directory could not be determined")]
    NoHome,

    #[error("{0} does not exist")]
    Missing(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("no <scale> element found")]
    NoScaleElement,

    #[error("<scale> value {0:?} is not a usable number")]
    InvalidValue(String),
}
