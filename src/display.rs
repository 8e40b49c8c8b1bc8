/// Monitor scale detection
///
/// GNOME records per-monitor scaling in `~/.config/monitors.xml`. The first
/// `<scale>` value found is rounded to an integer and used to size the
/// windows. Any problem reading it falls back to 1, but the two paths are
/// logged differently and reported through `ScaleReading` so callers (and
/// tests) can tell them apart.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::ScaleError;

pub const DEFAULT_SCALE: u32 = 1;

/// Outcome of reading the monitor config
#[derive(Debug)]
pub enum ScaleReading {
    /// A `<scale>` element was found and parsed
    Parsed(u32),
    /// Something went wrong; the default applies
    Fallback(ScaleError),
}

impl ScaleReading {
    pub fn value(&self) -> u32 {
        match self {
            ScaleReading::Parsed(scale) => *scale,
            ScaleReading::Fallback(_) => DEFAULT_SCALE,
        }
    }
}

/// Location of the GNOME monitor config for the current user
pub fn monitors_xml_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("monitors.xml"))
}

/// Read the scale for the current user, logging which path was taken
pub fn detect_scale() -> ScaleReading {
    let reading = match monitors_xml_path() {
        Some(path) => read_scale(&path),
        None => ScaleReading::Fallback(ScaleError::NoHome),
    };

    match &reading {
        ScaleReading::Parsed(scale) => info!(scale, "Monitor scale read from monitors.xml"),
        ScaleReading::Fallback(reason) => {
            warn!(%reason, scale = DEFAULT_SCALE, "Using default monitor scale")
        }
    }

    reading
}

/// Parse, default-on-any-error
pub fn read_scale(path: &Path) -> ScaleReading {
    match try_read_scale(path) {
        Ok(scale) => ScaleReading::Parsed(scale),
        Err(reason) => ScaleReading::Fallback(reason),
    }
}

fn try_read_scale(path: &Path) -> Result<u32, ScaleError> {
    if !path.exists() {
        return Err(ScaleError::Missing(path.to_path_buf()));
    }

    let xml = std::fs::read_to_string(path).map_err(|source| ScaleError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_scale(&xml)
}

/// Extract the first `<scale>` anywhere in the document
fn parse_scale(xml: &str) -> Result<u32, ScaleError> {
    let doc = roxmltree::Document::parse(xml)?;

    let node = doc
        .descendants()
        .find(|n| n.has_tag_name("scale"))
        .ok_or(ScaleError::NoScaleElement)?;

    let raw = node.text().unwrap_or("").trim();
    let value: f64 = raw
        .parse()
        .map_err(|_| ScaleError::InvalidValue(raw.to_string()))?;

    // Python-style rounding: halves go to the even neighbour
    let rounded = value.round_ties_even();
    if !rounded.is_finite() || rounded < 1.0 {
        return Err(ScaleError::InvalidValue(raw.to_string()));
    }

    Ok(rounded as u32)
}
