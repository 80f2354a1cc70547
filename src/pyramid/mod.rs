//! Pyramid model and configuration.
//!
//! - [`PyramidSettings`]: raw values, as read from a configuration file
//! - [`PyramidConfig`]: the validated pyramid with its derived level table
//! - [`load_pyramid`]: read and validate a key/value configuration file

mod config_file;
mod model;

pub use config_file::{load_pyramid, parse_settings, read_settings};
pub use model::{
    BoundingBox, PyramidConfig, PyramidSettings, RasterSize, ResolutionSet, DEFAULT_BOUNDING_BOX,
    DEFAULT_DATA_TYPE, DEFAULT_MIME_TYPE, DEFAULT_PAGE_SIZE,
};
