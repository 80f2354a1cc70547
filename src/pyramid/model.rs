//! Tile pyramid model.
//!
//! A [`PyramidConfig`] describes the virtual raster served by the module:
//! its full pixel size, the square tile size, the plane extent mapped onto
//! the raster, and the table of resolution levels derived from them.
//!
//! # Level Layout
//!
//! Levels are numbered coarsest first. The finest (last) level holds the
//! raster at native resolution; each coarser level halves the pixel size
//! (rounding up) and doubles the plane distance covered by one pixel, until
//! the whole raster fits in a single tile:
//!
//! ```text
//! Size 2048x2048, PageSize 512
//!
//! level 0:  512 x  512 px   1x1 tiles   res = 4 * native
//! level 1: 1024 x 1024 px   2x2 tiles   res = 2 * native
//! level 2: 2048 x 2048 px   4x4 tiles   res = native
//! ```
//!
//! `skip_levels` hides the coarsest levels from clients: with
//! `skip_levels = 1` the visible level 0 is full level 1.

use bytes::Bytes;
use serde::Serialize;

use crate::error::ConfigError;
use crate::tile::{is_valid_quality, OutputFormat, RawTile, TileEncoder, DEFAULT_JPEG_QUALITY};

// =============================================================================
// Constants
// =============================================================================

/// Default tile edge length in pixels.
pub const DEFAULT_PAGE_SIZE: u64 = 512;

/// Default output MIME type.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Default sample type.
pub const DEFAULT_DATA_TYPE: &str = "Byte";

/// Plane extent used when the configuration names none.
pub const DEFAULT_BOUNDING_BOX: BoundingBox = BoundingBox {
    x_min: -2.0,
    y_min: -1.5,
    x_max: 1.0,
    y_max: 1.5,
};

/// Slack added to the raw tile size when deriving the default encode bound.
const ENCODE_HEADROOM: usize = 4096;

// =============================================================================
// Geometry
// =============================================================================

/// Size of a raster or page: pixels in x and y, depth (z) and band count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RasterSize {
    pub x: u64,
    pub y: u64,
    pub z: u64,
    pub bands: u64,
}

impl RasterSize {
    /// A single-band, single-slice size.
    pub fn new(x: u64, y: u64) -> Self {
        Self {
            x,
            y,
            z: 1,
            bands: 1,
        }
    }

    /// A square single-band, single-slice size.
    pub fn square(side: u64) -> Self {
        Self::new(side, side)
    }

    pub fn with_depth(mut self, z: u64) -> Self {
        self.z = z;
        self
    }

    pub fn with_bands(mut self, bands: u64) -> Self {
        self.bands = bands;
        self
    }
}

/// Plane-coordinate rectangle mapped onto the full raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let finite = [self.x_min, self.y_min, self.x_max, self.y_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(ConfigError::InvalidBoundingBox(format!(
                "{:?} has non-finite coordinates",
                self
            )));
        }
        if self.x_max <= self.x_min || self.y_max <= self.y_min {
            return Err(ConfigError::InvalidBoundingBox(format!(
                "{:?} has an empty extent",
                self
            )));
        }
        Ok(())
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        DEFAULT_BOUNDING_BOX
    }
}

/// One level of the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolutionSet {
    /// Level width in pixels
    pub width: u64,

    /// Level height in pixels
    pub height: u64,

    /// Number of tiles in X direction
    pub tiles_x: u64,

    /// Number of tiles in Y direction
    pub tiles_y: u64,

    /// Plane distance covered by one pixel along x
    pub resolution_x: f64,

    /// Plane distance covered by one pixel along y
    pub resolution_y: f64,
}

// =============================================================================
// Pyramid Settings
// =============================================================================

/// Unvalidated pyramid description, as read from a configuration source.
///
/// Turn it into a [`PyramidConfig`] with [`PyramidConfig::new`].
#[derive(Debug, Clone)]
pub struct PyramidSettings {
    /// Full raster size; mandatory
    pub size: Option<RasterSize>,

    /// Tile size; defaults to 512x512, depth 1, raster band count
    pub page_size: Option<RasterSize>,

    pub bounding_box: BoundingBox,

    /// Signed so that negative values from a config file reach validation
    pub skip_levels: i64,

    pub data_type: String,

    pub mime_type: String,

    /// JPEG quality, 1-100
    pub quality: u8,

    /// Upper bound for an encoded tile; derived from the page size when unset
    pub max_tile_size: Option<usize>,

    /// Pre-encoded empty tile; an encoded all-zero tile when unset
    pub empty_tile: Option<Bytes>,
}

impl Default for PyramidSettings {
    fn default() -> Self {
        Self {
            size: None,
            page_size: None,
            bounding_box: DEFAULT_BOUNDING_BOX,
            skip_levels: 0,
            data_type: DEFAULT_DATA_TYPE.to_string(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            quality: DEFAULT_JPEG_QUALITY,
            max_tile_size: None,
            empty_tile: None,
        }
    }
}

impl PyramidSettings {
    /// Settings for a raster of the given size, all else default.
    pub fn new(size: RasterSize) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// Use square tiles of `side` pixels.
    pub fn with_page_size(mut self, side: u64) -> Self {
        let bands = self.size.map(|s| s.bands).unwrap_or(1);
        self.page_size = Some(RasterSize::square(side).with_bands(bands));
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    pub fn with_skip_levels(mut self, skip_levels: i64) -> Self {
        self.skip_levels = skip_levels;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_max_tile_size(mut self, max_tile_size: usize) -> Self {
        self.max_tile_size = Some(max_tile_size);
        self
    }

    pub fn with_empty_tile(mut self, empty_tile: impl Into<Bytes>) -> Self {
        self.empty_tile = Some(empty_tile.into());
        self
    }
}

// =============================================================================
// Pyramid Config
// =============================================================================

/// Validated, immutable pyramid description.
///
/// Built once at startup and shared read-only (behind an `Arc`) by every
/// request handler.
#[derive(Debug, Clone)]
pub struct PyramidConfig {
    size: RasterSize,
    tile_size: u32,
    bounding_box: BoundingBox,
    skip_levels: usize,
    levels: Vec<ResolutionSet>,
    format: OutputFormat,
    quality: u8,
    max_tile_size: usize,
    empty_tile: Bytes,
}

impl PyramidConfig {
    /// Validate settings and derive the level table.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the size is missing or malformed, the
    /// tiles are not square, the pixel format or output format is not
    /// supported, `skip_levels` leaves no visible level, or the empty tile
    /// cannot be produced within the size bound.
    pub fn new(settings: PyramidSettings) -> Result<Self, ConfigError> {
        let size = settings.size.ok_or(ConfigError::MissingDirective("Size"))?;
        validate_raster_size(&size)?;

        let page = settings.page_size.unwrap_or(RasterSize {
            x: DEFAULT_PAGE_SIZE,
            y: DEFAULT_PAGE_SIZE,
            z: 1,
            bands: size.bands,
        });
        if page.bands != size.bands || page.z != 1 {
            return Err(ConfigError::InvalidPageSize(format!(
                "page depth must be 1 and bands must match the raster ({}), got depth {} bands {}",
                size.bands, page.z, page.bands
            )));
        }
        if page.x != page.y {
            return Err(ConfigError::NonSquareTile {
                width: page.x,
                height: page.y,
            });
        }
        let tile_size = u32::try_from(page.x)
            .ok()
            .filter(|&side| side > 0)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "PageSize",
                value: page.x.to_string(),
            })?;

        if size.bands != 1 {
            return Err(ConfigError::UnsupportedPixelFormat(format!(
                "{} bands (only single-band rasters are rendered)",
                size.bands
            )));
        }
        if !settings.data_type.eq_ignore_ascii_case(DEFAULT_DATA_TYPE) {
            return Err(ConfigError::UnsupportedPixelFormat(format!(
                "data type {} (only Byte is rendered)",
                settings.data_type
            )));
        }

        let format = OutputFormat::from_mime_type(&settings.mime_type)
            .ok_or_else(|| ConfigError::UnsupportedFormat(settings.mime_type.clone()))?;

        if !is_valid_quality(settings.quality) {
            return Err(ConfigError::InvalidValue {
                key: "Quality",
                value: settings.quality.to_string(),
            });
        }

        settings.bounding_box.validate()?;

        let levels = build_levels(&size, u64::from(tile_size), &settings.bounding_box);

        let skip_levels = usize::try_from(settings.skip_levels)
            .ok()
            .filter(|&skip| skip < levels.len())
            .ok_or(ConfigError::InvalidSkipLevels {
                skip_levels: settings.skip_levels,
                level_count: levels.len(),
            })?;

        let max_tile_size = match settings.max_tile_size {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "MaxTileSize",
                    value: "0".to_string(),
                })
            }
            Some(max) => max,
            None => default_max_tile_size(tile_size),
        };

        let mut pyramid = Self {
            size,
            tile_size,
            bounding_box: settings.bounding_box,
            skip_levels,
            levels,
            format,
            quality: settings.quality,
            max_tile_size,
            empty_tile: Bytes::new(),
        };

        pyramid.empty_tile = match settings.empty_tile {
            Some(data) if data.len() > max_tile_size => {
                return Err(ConfigError::EmptyTile(format!(
                    "{} bytes exceeds MaxTileSize {}",
                    data.len(),
                    max_tile_size
                )))
            }
            Some(data) => data,
            None => pyramid.encode_blank_tile()?,
        };

        Ok(pyramid)
    }

    /// Full raster size.
    pub fn size(&self) -> RasterSize {
        self.size
    }

    /// Tile edge length in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// Number of coarse levels hidden from clients.
    pub fn skip_levels(&self) -> usize {
        self.skip_levels
    }

    /// Number of levels in the full pyramid, skipped ones included.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Number of levels clients can address.
    pub fn visible_level_count(&self) -> usize {
        self.levels.len() - self.skip_levels
    }

    /// Level table of the full pyramid, coarsest first.
    pub fn levels(&self) -> &[ResolutionSet] {
        &self.levels
    }

    /// Level `full_level` of the full pyramid.
    pub fn level(&self, full_level: usize) -> Option<&ResolutionSet> {
        self.levels.get(full_level)
    }

    /// Whether request addresses carry a leading extra-axis (z) component.
    pub fn has_extra_axis(&self) -> bool {
        self.size.z > 1
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Upper bound for any encoded tile, in bytes.
    pub fn max_tile_size(&self) -> usize {
        self.max_tile_size
    }

    /// Payload returned for addresses outside the pyramid.
    pub fn empty_tile(&self) -> &Bytes {
        &self.empty_tile
    }

    /// Encoder configured for this pyramid.
    pub fn encoder(&self) -> TileEncoder {
        TileEncoder::new(self.format, self.quality)
    }

    fn encode_blank_tile(&self) -> Result<Bytes, ConfigError> {
        let side = self.tile_size as usize;
        let blank = RawTile::new(self.tile_size, vec![0u8; side * side]);
        self.encoder()
            .encode(&blank, self.max_tile_size)
            .map_err(|e| ConfigError::EmptyTile(e.to_string()))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn validate_raster_size(size: &RasterSize) -> Result<(), ConfigError> {
    if size.x == 0 || size.y == 0 || size.z == 0 || size.bands == 0 {
        return Err(ConfigError::InvalidValue {
            key: "Size",
            value: format!("{} {} {} {}", size.x, size.y, size.z, size.bands),
        });
    }
    Ok(())
}

/// Worst case for a barely compressible tile plus format overhead.
fn default_max_tile_size(tile_size: u32) -> usize {
    let side = tile_size as usize;
    side.saturating_mul(side)
        .saturating_mul(2)
        .saturating_add(ENCODE_HEADROOM)
}

/// Derive the level table, coarsest level first.
fn build_levels(size: &RasterSize, tile_size: u64, bbox: &BoundingBox) -> Vec<ResolutionSet> {
    let mut width = size.x;
    let mut height = size.y;
    let mut resolution_x = bbox.width() / size.x as f64;
    let mut resolution_y = bbox.height() / size.y as f64;

    let mut levels = Vec::new();
    loop {
        let tiles_x = width.div_ceil(tile_size);
        let tiles_y = height.div_ceil(tile_size);

        levels.push(ResolutionSet {
            width,
            height,
            tiles_x,
            tiles_y,
            resolution_x,
            resolution_y,
        });

        if tiles_x == 1 && tiles_y == 1 {
            break;
        }

        width = 1 + (width - 1) / 2;
        height = 1 + (height - 1) / 2;
        resolution_x *= 2.0;
        resolution_y *= 2.0;
    }

    levels.reverse();
    levels
}

// =============================================================================
// Tests
// =============================================================================
