//! Error types for the graphex extraction pipeline.
//!
//! Errors are split by blast radius: [`DocumentError`] aborts the whole run
//! before any output is written, while [`ObjectError`] is scoped to a single
//! image object and ends up in the error log.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for graphex operations.
#[derive(Error, Debug)]
pub enum GraphexError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Fatal document-level errors
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Fatal errors: the container is malformed or unreadable.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// An image object lacks /Width, /Height or /BitsPerComponent
    #[error("Image {object_number} missing dimension metadata")]
    MissingDimensionMetadata { object_number: u32 },

    /// An image object has no stream keyword
    #[error("Image {object_number} has no stream")]
    MissingStream { object_number: u32 },

    /// Document file not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Document exceeds the configured size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Document could not be read
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-object errors. These never abort a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectError {
    #[error("Unsupported colorspace {0}")]
    UnsupportedColorSpace(String),

    #[error("Unsupported filter {0}")]
    UnsupportedEncoding(String),

    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u32),

    #[error("Unexpected data length: got {actual}, expected {expected}")]
    SizeMismatch { actual: usize, expected: usize },

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Compression failed: {0}")]
    Compression(String),

    /// Zero-sized or over-limit dimensions
    #[error("Invalid dimensions {width}x{height} (each must be 1..={max_dim})")]
    InvalidDimensions { width: u32, height: u32, max_dim: u32 },

    /// The worker running this object's pipeline did not complete
    #[error("Processing task failed: {0}")]
    TaskFailed(String),
}

/// An [`ObjectError`] tagged with the object it came from.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("obj{object_number}: {error}")]
pub struct ObjectFailure {
    pub object_number: u32,
    pub error: ObjectError,
}

/// Convenience type alias for graphex results.
pub type Result<T> = std::result::Result<T, GraphexError>;

/// Convenience type alias for per-object results.
pub type ObjectResult<T> = std::result::Result<T, ObjectError>;
