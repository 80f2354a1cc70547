//! Tile Service for orchestrating tile generation.
//!
//! The TileService is the main entry point for tile requests. It:
//! - Parses and resolves the requested address
//! - Answers out-of-bounds addresses with the pyramid's empty tile
//! - Renders and encodes in-bounds tiles on the blocking pool
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         TileService                             │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    get_tile()                           │    │
//! │  │  1. Parse address     3. Render (spawn_blocking)        │    │
//! │  │  2. Resolve           4. Encode within MaxTileSize      │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌──────────────┐   ┌────────────────────┐  ┌─────────────┐   │
//! │    │ PyramidConfig│   │ MandelbrotRenderer │  │ TileEncoder │   │
//! │    └──────────────┘   └────────────────────┘  └─────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::error::TileError;
use crate::pyramid::PyramidConfig;

use super::address::{resolve, PyramidTile, ResolvedTile, TileAddress};
use super::encoder::TileEncoder;
use super::render::MandelbrotRenderer;

// =============================================================================
// Tile Response
// =============================================================================

/// Response from the tile service.
#[derive(Debug, Clone)]
pub struct TileResponse {
    /// The encoded tile data
    pub data: Bytes,

    /// MIME type of `data`
    pub content_type: &'static str,

    /// Whether the tile was rendered (false for the empty tile)
    pub rendered: bool,
}

// =============================================================================
// Tile Service
// =============================================================================

/// Service for resolving, rendering and encoding tiles.
///
/// Cloning is cheap; clones share the same pyramid.
///
/// # Example
///
/// ```ignore
/// use fractal_tiles::pyramid::load_pyramid;
/// use fractal_tiles::tile::TileService;
///
/// let service = TileService::new(load_pyramid("mandelbrot.conf")?);
///
/// let response = service.get_tile("2/1/3.png").await?;
/// println!("{} bytes of {}", response.data.len(), response.content_type);
/// ```
#[derive(Debug, Clone)]
pub struct TileService {
    pyramid: Arc<PyramidConfig>,
    renderer: MandelbrotRenderer,
    encoder: TileEncoder,
}

impl TileService {
    /// Create a new tile service for a pyramid.
    pub fn new(pyramid: PyramidConfig) -> Self {
        Self::with_shared_pyramid(Arc::new(pyramid))
    }

    /// Create a new tile service with a shared pyramid.
    pub fn with_shared_pyramid(pyramid: Arc<PyramidConfig>) -> Self {
        let encoder = pyramid.encoder();
        Self {
            pyramid,
            renderer: MandelbrotRenderer::new(),
            encoder,
        }
    }

    /// Get a reference to the underlying pyramid.
    pub fn pyramid(&self) -> &Arc<PyramidConfig> {
        &self.pyramid
    }

    /// Parse a request path and classify it against the pyramid.
    pub fn resolve(&self, path: &str) -> Result<ResolvedTile, TileError> {
        let address = TileAddress::from_path(path, self.pyramid.has_extra_axis())?;
        Ok(resolve(&address, &self.pyramid))
    }

    /// Get the tile at a request path.
    ///
    /// Out-of-bounds addresses yield the empty tile without rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path does not spell a tile address
    /// - The tile buffer cannot be allocated
    /// - The encoded tile exceeds the pyramid's maximum tile size
    /// - The blocking render task fails
    pub async fn get_tile(&self, path: &str) -> Result<TileResponse, TileError> {
        match self.resolve(path)? {
            ResolvedTile::OutOfBounds => Ok(self.empty_tile()),
            ResolvedTile::InBounds(tile) => {
                let service = self.clone();
                let data = tokio::task::spawn_blocking(move || service.generate_tile(&tile))
                    .await
                    .map_err(|e| TileError::Worker {
                        message: e.to_string(),
                    })??;

                Ok(TileResponse {
                    data,
                    content_type: self.pyramid.mime_type(),
                    rendered: true,
                })
            }
        }
    }

    /// Render and encode a resolved tile on the current thread.
    pub fn generate_tile(&self, tile: &PyramidTile) -> Result<Bytes, TileError> {
        let raw = self.renderer.render(tile, &self.pyramid)?;
        let data = self.encoder.encode(&raw, self.pyramid.max_tile_size())?;

        debug!(
            level = tile.level,
            row = tile.row,
            column = tile.column,
            bytes = data.len(),
            "Rendered tile"
        );
        Ok(data)
    }

    /// The pyramid's empty tile.
    pub fn empty_tile(&self) -> TileResponse {
        TileResponse {
            data: self.pyramid.empty_tile().clone(),
            content_type: self.pyramid.mime_type(),
            rendered: false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
