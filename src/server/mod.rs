//! HTTP server layer for the fractal tile server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │               GET /tiles/[{z}/]{level}/{row}/{column}           │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    gate     │  │        routes           │  │
//! │  │ (requests)  │  │  (regexps)  │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod gate;
pub mod handlers;
pub mod routes;

pub use gate::{gate_middleware, GateError, RequestGate};
pub use handlers::{
    health_handler, pyramid_handler, tile_handler, AppState, ErrorResponse, HandlerError,
    HealthResponse, LevelMetadataResponse, PyramidMetadataResponse, DEFAULT_CACHE_MAX_AGE,
};
pub use routes::{create_router, RouterConfig};
