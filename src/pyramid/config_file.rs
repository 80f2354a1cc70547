//! Key/value pyramid configuration files.
//!
//! ```text
//! # Mandelbrot overview
//! Size          2048 2048
//! PageSize      512 512
//! MimeType      image/png
//! SkippedLevels 0
//! BoundingBox   -2.0,-1.5,1.0,1.5
//! ```
//!
//! The key is the first word of a line and the value the rest of it. Keys
//! are case-insensitive, `#` starts a comment line, and a repeated key keeps
//! its first value.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::error::ConfigError;

use super::model::{BoundingBox, PyramidConfig, PyramidSettings, RasterSize};

/// Load, parse and validate a pyramid configuration file.
pub fn load_pyramid(path: impl AsRef<Path>) -> Result<PyramidConfig, ConfigError> {
    PyramidConfig::new(read_settings(path)?)
}

/// Read a configuration file into unvalidated settings.
///
/// `EmptyTile` paths are resolved relative to the file's directory.
pub fn read_settings(path: impl AsRef<Path>) -> Result<PyramidSettings, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    debug!(path = %path.display(), "Read pyramid configuration");
    parse_settings(&text, base_dir)
}

/// Parse configuration text into unvalidated settings.
pub fn parse_settings(text: &str, base_dir: &Path) -> Result<PyramidSettings, ConfigError> {
    let entries = parse_key_values(text);
    let mut settings = PyramidSettings::default();

    if let Some(value) = entries.get("size") {
        settings.size = Some(parse_raster_size("Size", value, 1)?);
    }

    if let Some(value) = entries.get("pagesize") {
        let bands = settings.size.map(|s| s.bands).unwrap_or(1);
        settings.page_size = Some(parse_raster_size("PageSize", value, bands)?);
    }

    if let Some(value) = entries.get("mimetype") {
        settings.mime_type = value.clone();
    }

    if let Some(value) = entries.get("skippedlevels") {
        settings.skip_levels = parse_number("SkippedLevels", value)?;
    }

    if let Some(value) = entries.get("boundingbox") {
        settings.bounding_box = parse_bounding_box(value)?;
    }

    if let Some(value) = entries.get("datatype") {
        settings.data_type = value.clone();
    }

    if let Some(value) = entries.get("quality") {
        settings.quality = parse_number("Quality", value)?;
    }

    if let Some(value) = entries.get("maxtilesize") {
        settings.max_tile_size = Some(parse_number("MaxTileSize", value)?);
    }

    if let Some(value) = entries.get("emptytile") {
        let tile_path = base_dir.join(value);
        let data = fs::read(&tile_path).map_err(|e| ConfigError::Read {
            path: tile_path.display().to_string(),
            message: e.to_string(),
        })?;
        settings.empty_tile = Some(Bytes::from(data));
    }

    Ok(settings)
}

/// Split configuration text into lowercase keys and trimmed values.
fn parse_key_values(text: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = match line.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => (line, ""),
        };

        entries
            .entry(key.to_ascii_lowercase())
            .or_insert_with(|| value.to_string());
    }

    entries
}

/// Parse `x y [z [c]]`.
fn parse_raster_size(
    key: &'static str,
    value: &str,
    default_bands: u64,
) -> Result<RasterSize, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    };

    let numbers = value
        .split_whitespace()
        .map(|token| token.parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    match numbers.as_slice() {
        [x, y] => Ok(RasterSize::new(*x, *y).with_bands(default_bands)),
        [x, y, z] => Ok(RasterSize::new(*x, *y)
            .with_depth(*z)
            .with_bands(default_bands)),
        [x, y, z, c] => Ok(RasterSize::new(*x, *y).with_depth(*z).with_bands(*c)),
        _ => Err(invalid()),
    }
}

fn parse_bounding_box(value: &str) -> Result<BoundingBox, ConfigError> {
    let invalid = || ConfigError::InvalidBoundingBox(value.to_string());

    let coords = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    match coords.as_slice() {
        [x_min, y_min, x_max, y_max] => Ok(BoundingBox::new(*x_min, *y_min, *x_max, *y_max)),
        _ => Err(invalid()),
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
