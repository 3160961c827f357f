//! Core data types for the graphex extraction pipeline.
//!
//! [`ImageObject`] is what the scanner recovers from the document;
//! [`AnalysisResult`] and [`ManifestEntry`] are what the pipeline derives
//! from it. Nothing here is mutated after construction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ObjectError, ObjectResult};

/// Declared `/ColorSpace` of an image object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceRgb,
    DeviceGray,
    /// Any other name, kept verbatim for error messages and the manifest
    Other(String),
}

impl ColorSpace {
    /// Map a PDF name (with its leading slash) to a color space.
    pub fn from_name(name: &str) -> Self {
        match name {
            "/DeviceRGB" => Self::DeviceRgb,
            "/DeviceGray" => Self::DeviceGray,
            other => Self::Other(other.to_string()),
        }
    }

    /// Number of 8-bit samples per pixel.
    pub fn channels(&self) -> ObjectResult<usize> {
        match self {
            Self::DeviceRgb => Ok(3),
            Self::DeviceGray => Ok(1),
            Self::Other(name) => Err(ObjectError::UnsupportedColorSpace(name.clone())),
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceRgb => write!(f, "/DeviceRGB"),
            Self::DeviceGray => write!(f, "/DeviceGray"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Declared `/Filter` of an image object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFilter {
    /// `/FlateDecode`: zlib-wrapped deflate over raw samples
    Flate,
    /// `/DCTDecode`: a JPEG file, passed through untouched
    Dct,
    /// Anything else; empty when the object declares no filter
    Unsupported(String),
}

impl StreamFilter {
    pub fn from_name(name: &str) -> Self {
        match name {
            "/FlateDecode" => Self::Flate,
            "/DCTDecode" => Self::Dct,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

impl fmt::Display for StreamFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flate => write!(f, "/FlateDecode"),
            Self::Dct => write!(f, "/DCTDecode"),
            Self::Unsupported(name) if name.is_empty() => write!(f, "(none)"),
            Self::Unsupported(name) => write!(f, "{name}"),
        }
    }
}

/// One image XObject discovered in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageObject {
    pub object_number: u32,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub bits_per_component: u32,
    pub filter: StreamFilter,
    /// Stream bytes exactly as stored in the document
    pub raw_stream: Vec<u8>,
}

impl ImageObject {
    /// Number of channels implied by the color space.
    pub fn channels(&self) -> ObjectResult<usize> {
        self.color_space.channels()
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_dimensions(self.width, self.height)
    }
}

/// Byte length of a fully decoded 8-bit buffer, or `None` if it does not
/// fit in `usize`.
pub fn sample_len(width: u32, height: u32, channels: usize) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(channels)
}

/// Aspect of an image, from width vs height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Square,
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width == height {
            Self::Square
        } else if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MIME type of a manifest payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MimeType {
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg")]
    Jpeg,
}

impl MimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// File extension used for generated names.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-image color summary produced by the analyzer.
///
/// `palette_size` is `None` when the image has more distinct pixel tuples
/// than the palette cap; it is never a truncated count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub means: Vec<f64>,
    pub variances: Vec<f64>,
    pub min: Vec<u8>,
    pub max: Vec<u8>,
    pub palette_size: Option<usize>,
    pub primary_color: String,
    pub orientation: Orientation,
}

impl AnalysisResult {
    /// Average of the per-channel variances.
    pub fn mean_variance(&self) -> f64 {
        if self.variances.is_empty() {
            return 0.0;
        }
        self.variances.iter().sum::<f64>() / self.variances.len() as f64
    }
}

/// One extracted image as written to the manifest.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub object_number: u32,
    pub width: u32,
    pub height: u32,
    pub color_space: String,
    pub bits_per_component: u32,
    pub mime: MimeType,
    /// Standard base64 of the PNG or JPEG payload
    pub base64: String,

    /// Absent for pass-through (JPEG) payloads
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub analysis: Option<AnalysisResult>,
}
