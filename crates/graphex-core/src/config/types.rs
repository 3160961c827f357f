//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of image objects processed concurrently
    pub parallel_workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum document size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Maximum size of a single decompressed stream in megabytes
    pub max_decoded_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 512,
            max_image_dimension: 20000,
            max_decoded_mb: 512,
        }
    }
}

impl LimitsConfig {
    /// Decoded-stream limit in bytes.
    pub fn max_decoded_bytes(&self) -> u64 {
        self.max_decoded_mb.saturating_mul(1024 * 1024)
    }
}

/// Channel statistics and color classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Distinct pixel tuples tracked before the palette is reported as too large
    pub palette_cap: usize,

    /// Below this spread of channel means an RGB image is classified as gray
    pub gray_spread: f64,

    /// Upper bounds of the black / dark-gray / mid-gray / light-gray bands
    pub brightness_thresholds: [f64; 4],
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            palette_cap: 1024,
            gray_spread: 12.0,
            brightness_thresholds: [16.0, 64.0, 160.0, 224.0],
        }
    }
}

/// Semantic naming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Joins the name parts
    pub separator: String,

    /// Largest known palette still called "two-tone"
    pub two_tone_max_palette: usize,

    /// Mean channel variance below which an image is "low-contrast"
    pub low_contrast_variance: f64,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            separator: "-".to_string(),
            two_tone_max_palette: 4,
            low_contrast_variance: 400.0,
        }
    }
}

/// PNG re-encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// zlib compression level for IDAT data (0-9)
    pub compression_level: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the manifest and error log
    pub dir: PathBuf,

    /// Manifest file name inside `dir`
    pub manifest_file: String,

    /// Error log file name inside `dir`
    pub error_file: String,

    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("extracted_graphics"),
            manifest_file: "images.json".to_string(),
            error_file: "errors.txt".to_string(),
            format: "json".to_string(),
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
