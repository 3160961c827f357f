//! Extraction pipeline components.
//!
//! This module contains all the stages of the extraction pipeline:
//! - **validate**: Document checks and the single upfront read
//! - **scan**: Locate image XObjects in the raw document bytes
//! - **decode**: Inflate Flate streams, pass DCT streams through
//! - **analyze**: Per-channel statistics and palette estimation
//! - **encode**: Minimal 8-bit PNG writer
//! - **naming**: Descriptive file names from dimensions and analysis
//! - **processor**: Runs one object through every stage
//! - **manifest**: Bounded-concurrency assembly of the ordered manifest

pub mod analyze;
pub mod decode;
pub mod encode;
pub mod manifest;
pub mod naming;
pub mod processor;
pub mod scan;
pub mod validate;

// Re-exports for convenient access
pub use analyze::{ChannelAnalyzer, ChannelStats, PaletteTracker};
pub use decode::{DecodedStream, StreamDecoder};
pub use encode::PngEncoder;
pub use manifest::{Manifest, ManifestAssembler, ObjectOutcome};
pub use naming::SemanticNamer;
pub use processor::ObjectProcessor;
pub use scan::{scan, scan_document, ImageObjects};
pub use validate::Validator;
