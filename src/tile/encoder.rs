//! Bounded tile encoder.
//!
//! This module turns a raw single-band tile into a compressed image payload.
//!
//! # Design Decisions
//!
//! - **Bounded destination**: The codec writes into a buffer pre-sized to the
//!   configured maximum. A payload that does not fit is an overflow error;
//!   it is never truncated and never retried with a larger buffer.
//!
//! - **One format per pyramid**: The output format is fixed at configuration
//!   time. Requests cannot ask for a different encoding.
//!
//! - **8-bit luma only**: Tiles carry one byte per pixel, encoded as
//!   grayscale PNG or JPEG.

use std::io::{self, Write};

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::TileError;

use super::render::RawTile;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Output Format
// =============================================================================

/// Compressed image format produced for a pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossless PNG
    Png,

    /// Baseline JPEG
    Jpeg,
}

impl OutputFormat {
    /// Look up the format for a MIME type (case-insensitive).
    ///
    /// Returns `None` for types without an encoder.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(OutputFormat::Png),
            "image/jpeg" | "image/jpg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }

    /// The MIME type sent as `Content-Type`.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

// =============================================================================
// Tile Encoder
// =============================================================================

/// Encoder for raw fractal tiles.
///
/// # Example
///
/// ```ignore
/// use fractal_tiles::tile::{OutputFormat, TileEncoder};
///
/// let encoder = TileEncoder::new(OutputFormat::Png, 80);
/// let payload = encoder.encode(&raw_tile, 600 * 1024)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TileEncoder {
    format: OutputFormat,
    quality: u8,
}

impl TileEncoder {
    /// Create an encoder for the given format.
    ///
    /// `quality` only affects JPEG output and is clamped to 1-100.
    pub fn new(format: OutputFormat, quality: u8) -> Self {
        Self {
            format,
            quality: clamp_quality(quality),
        }
    }

    /// The output format of this encoder.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// The JPEG quality of this encoder.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode a raw tile into at most `max_size` bytes.
    ///
    /// # Errors
    ///
    /// - [`TileError::EncodeOverflow`] if the compressed image does not fit
    ///   within `max_size` bytes
    /// - [`TileError::Allocation`] if the destination buffer cannot be reserved
    /// - [`TileError::Encode`] if the codec rejects the pixel data
    pub fn encode(&self, tile: &RawTile, max_size: usize) -> Result<Bytes, TileError> {
        let side = tile.size();
        let expected = (side as usize) * (side as usize);
        if tile.pixels().len() != expected {
            return Err(TileError::Encode {
                message: format!(
                    "tile buffer holds {} bytes, expected {} for {}x{}",
                    tile.pixels().len(),
                    expected,
                    side,
                    side
                ),
            });
        }

        let mut sink = BoundedWriter::with_limit(max_size)?;

        let result = match self.format {
            OutputFormat::Png => PngEncoder::new(&mut sink).write_image(
                tile.pixels(),
                side,
                side,
                ExtendedColorType::L8,
            ),
            OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut sink, self.quality)
                .write_image(tile.pixels(), side, side, ExtendedColorType::L8),
        };

        // A codec may swallow a failed write, so the overflow flag wins over Ok.
        if sink.overflowed() {
            return Err(TileError::EncodeOverflow { max_size });
        }

        result.map_err(|e| TileError::Encode {
            message: e.to_string(),
        })?;

        Ok(sink.into_bytes())
    }
}

// =============================================================================
// Bounded Writer
// =============================================================================

/// In-memory writer that refuses to grow past a fixed limit.
struct BoundedWriter {
    buf: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl BoundedWriter {
    fn with_limit(limit: usize) -> Result<Self, TileError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(limit)
            .map_err(|_| TileError::Allocation { bytes: limit })?;
        Ok(Self {
            buf,
            limit,
            overflowed: false,
        })
    }

    fn overflowed(&self) -> bool {
        self.overflowed
    }

    fn into_bytes(self) -> Bytes {
        Bytes::from(self.buf)
    }
}

impl Write for BoundedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.len() > self.limit - self.buf.len() {
            self.overflowed = true;
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "encoded tile exceeds maximum size",
            ));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Validate JPEG quality parameter.
///
/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
