//! Tile service layer.
//!
//! This module turns request paths into encoded fractal tiles.
//!
//! # Architecture
//!
//! The tile service sits between the HTTP layer and the pyramid model:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   Address    │  │    Renderer     │  │
//! │  │   Resolver   │  │  (escape time)  │  │
//! │  └──────────────┘  └────────┬────────┘  │
//! │                             ▼           │
//! │                    ┌─────────────────┐  │
//! │                    │ Bounded Encoder │  │
//! │                    └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              PyramidConfig              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileService`]: Main entry point for tile requests, orchestrates the full pipeline
//! - [`TileAddress`] / [`resolve`]: Address parsing and the two-stage bounds check
//! - [`MandelbrotRenderer`]: Escape-time rendering of one tile
//! - [`TileEncoder`]: PNG/JPEG encoding into a size-bounded buffer
//! - [`TileResponse`]: Response containing tile data and its MIME type

mod address;
mod encoder;
mod render;
mod service;

pub use address::{
    check_full_bounds, check_visible_bounds, resolve, resolve_tokens, PyramidTile, ResolvedTile,
    TileAddress,
};
pub use encoder::{
    clamp_quality, is_valid_quality, OutputFormat, TileEncoder, DEFAULT_JPEG_QUALITY,
    MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
pub use render::{escape_time, MandelbrotRenderer, RawTile, ESCAPE_RADIUS_SQUARED, MAX_ITERATIONS};
pub use service::{TileResponse, TileService};
