use thiserror::Error;

/// Errors raised while loading or validating a pyramid configuration.
///
/// Any of these rejects the configuration: the server refuses to start
/// rather than serve tiles from a pyramid it cannot describe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration file (or a file it references) could not be read
    #[error("Cannot read {path}: {message}")]
    Read { path: String, message: String },

    /// A mandatory directive is absent
    #[error("{0} directive is mandatory")]
    MissingDirective(&'static str),

    /// A directive value could not be parsed or is out of range
    #[error("{key} incorrect: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    /// PageSize disagrees with the raster (band count) or has depth != 1
    #[error("PageSize has invalid parameters: {0}")]
    InvalidPageSize(String),

    /// Tiles must be square
    #[error("Tile size must be square, got {width}x{height}")]
    NonSquareTile { width: u64, height: u64 },

    /// Band count or sample type the renderer cannot produce
    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    /// Output MIME type without an encoder
    #[error("Unsupported output format: {0} (supported: image/png, image/jpeg)")]
    UnsupportedFormat(String),

    /// SkippedLevels must leave at least one visible level
    #[error("SkippedLevels {skip_levels} out of range (pyramid has {level_count} levels)")]
    InvalidSkipLevels { skip_levels: i64, level_count: usize },

    /// Bounding box with non-finite or inverted extents
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    /// The empty tile could not be produced or does not fit the size bound
    #[error("Invalid empty tile: {0}")]
    EmptyTile(String),
}

/// A request path that does not spell a tile address.
///
/// This is a request-format failure, distinct from an address that parses
/// but lies outside the pyramid (which is served as an empty tile).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Not enough trailing path segments
    #[error("Tile address needs {required} path segments, got {actual}")]
    TooFewTokens { required: usize, actual: usize },

    /// A segment that is not a non-negative integer
    #[error("Invalid {component} in tile address: {token:?}")]
    InvalidToken {
        component: &'static str,
        token: String,
    },
}

/// Errors that can occur while producing a tile.
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Malformed tile address
    #[error("Invalid tile address: {0}")]
    Address(#[from] AddressError),

    /// A resolved tile referenced a level the pyramid does not have
    #[error("Invalid level: {level} (pyramid has {max_levels} levels)")]
    InvalidLevel { level: usize, max_levels: usize },

    /// Memory for a tile buffer could not be obtained
    #[error("Cannot allocate {bytes} bytes for tile buffer")]
    Allocation { bytes: usize },

    /// Compressed output does not fit the configured maximum size
    #[error("Encoded tile exceeds the maximum size of {max_size} bytes")]
    EncodeOverflow { max_size: usize },

    /// The codec rejected the pixel data
    #[error("Failed to encode tile: {message}")]
    Encode { message: String },

    /// The blocking render task panicked or was cancelled
    #[error("Tile worker failed: {message}")]
    Worker { message: String },
}
