//! # Fractal Tiles
//!
//! A tile server that renders Mandelbrot-set tile pyramids on demand.
//!
//! A pyramid is described once, by a small key/value configuration file:
//! raster size, tile size, the region of the complex plane it covers, the
//! number of coarse levels to hide, and the output format. Each tile request
//! is resolved against that pyramid; tiles inside it are computed with the
//! escape-time algorithm and encoded into a size-bounded PNG or JPEG, and
//! addresses outside it get a fixed empty tile.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`pyramid`] - Pyramid model, level table and configuration file reader
//! - [`tile`] - Address resolution, rendering, encoding and the tile service
//! - [`server`] - Axum-based HTTP server, routes and request gating
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use fractal_tiles::{create_router, load_pyramid, RouterConfig, TileService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pyramid = load_pyramid("mandelbrot.conf")?;
//!     let router = create_router(TileService::new(pyramid), RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pyramid;
pub mod server;
pub mod tile;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, ServeConfig};
pub use error::{AddressError, ConfigError, TileError};
pub use pyramid::{
    load_pyramid, BoundingBox, PyramidConfig, PyramidSettings, RasterSize, ResolutionSet,
};
pub use server::{
    create_router, health_handler, pyramid_handler, tile_handler, AppState, ErrorResponse,
    HealthResponse, RequestGate, RouterConfig,
};
pub use tile::{
    resolve, MandelbrotRenderer, OutputFormat, PyramidTile, RawTile, ResolvedTile, TileAddress,
    TileEncoder, TileResponse, TileService,
};
