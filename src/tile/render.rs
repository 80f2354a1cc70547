//! Mandelbrot escape-time renderer.
//!
//! Each pixel of a tile is mapped to a point `c` of the complex plane and
//! coloured by how many iterations of `z <- z² + c` (from `z = 0`) it takes
//! for `|z|` to exceed 2, capped at 255. The evaluation is the plain
//! escape-time loop: no smoothing, no periodicity checks, no SIMD batches,
//! so a tile is a pure function of its address and the pyramid.
//!
//! # Pixel Mapping
//!
//! ```text
//! plane_x = bbox.x_min + (column * tile_size + px) * resolution_x
//! plane_y = bbox.y_max - (row    * tile_size + py) * resolution_y
//! ```
//!
//! Rows grow downwards in tile space and upwards in the plane, hence the
//! subtraction from `y_max`.

use crate::error::TileError;
use crate::pyramid::PyramidConfig;

use super::address::PyramidTile;

/// Iteration cap; also the value of pixels that never escape.
pub const MAX_ITERATIONS: u8 = 255;

/// Squared escape radius (|z| > 2).
pub const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

// =============================================================================
// Raw Tile
// =============================================================================

/// Unencoded tile: one escape-count byte per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTile {
    size: u32,
    pixels: Vec<u8>,
}

impl RawTile {
    /// Wrap a pixel buffer for a `size × size` tile.
    pub fn new(size: u32, pixels: Vec<u8>) -> Self {
        Self { size, pixels }
    }

    /// Tile edge length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Pixel bytes, `pixels[py * size + px]`.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Value at pixel `(px, py)`, or `None` outside the tile.
    pub fn pixel(&self, px: u32, py: u32) -> Option<u8> {
        if px >= self.size || py >= self.size {
            return None;
        }
        let offset = py as usize * self.size as usize + px as usize;
        self.pixels.get(offset).copied()
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Escape-time count for the point `c = cx + cy·i`.
///
/// Returns the number of iterations completed before `|z|² > 4`, or
/// [`MAX_ITERATIONS`] if the orbit stays bounded.
#[inline]
pub fn escape_time(cx: f64, cy: f64) -> u8 {
    let mut zx = 0.0f64;
    let mut zy = 0.0f64;

    for i in 0..MAX_ITERATIONS {
        let zx_sq = zx * zx;
        let zy_sq = zy * zy;

        if zx_sq + zy_sq > ESCAPE_RADIUS_SQUARED {
            return i;
        }

        zy = 2.0 * zx * zy + cy;
        zx = zx_sq - zy_sq + cx;
    }

    MAX_ITERATIONS
}

/// Stateless Mandelbrot tile renderer.
///
/// Safe to share between threads; every call allocates its own buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MandelbrotRenderer;

impl MandelbrotRenderer {
    /// Create a new renderer.
    pub fn new() -> Self {
        Self
    }

    /// Render the pixels of a resolved tile.
    ///
    /// # Errors
    ///
    /// - [`TileError::Allocation`] if the pixel buffer cannot be allocated
    /// - [`TileError::InvalidLevel`] if the tile's level does not exist in
    ///   `pyramid` (a tile resolved against a different pyramid)
    pub fn render(
        &self,
        tile: &PyramidTile,
        pyramid: &PyramidConfig,
    ) -> Result<RawTile, TileError> {
        let set = pyramid.level(tile.level).ok_or(TileError::InvalidLevel {
            level: tile.level,
            max_levels: pyramid.level_count(),
        })?;

        let size = pyramid.tile_size();
        let side = size as usize;
        let len = side.checked_mul(side).ok_or(TileError::Allocation {
            bytes: usize::MAX,
        })?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| TileError::Allocation { bytes: len })?;

        let bbox = pyramid.bounding_box();
        let origin_x = tile.column * u64::from(size);
        let origin_y = tile.row * u64::from(size);

        for py in 0..u64::from(size) {
            let cy = bbox.y_max - (origin_y + py) as f64 * set.resolution_y;
            for px in 0..u64::from(size) {
                let cx = bbox.x_min + (origin_x + px) as f64 * set.resolution_x;
                pixels.push(escape_time(cx, cy));
            }
        }

        Ok(RawTile::new(size, pixels))
    }
}

// =============================================================================
// Tests
// =============================================================================
