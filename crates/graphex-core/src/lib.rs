//! Graphex Core - Embeddable PDF image extraction library.
//!
//! Graphex scans a PDF's raw bytes for image XObjects, decodes what it can,
//! computes per-channel color statistics, and produces a manifest of
//! base64-encoded images with descriptive names.
//!
//! # Architecture
//!
//! ```text
//! Bytes → Scan → Decode (Flate) → Analyze → Encode PNG → Name → Manifest
//!              ↘ Pass through (DCT) ────────────────────↗
//! ```
//!
//! Objects are processed independently; one bad image becomes an error
//! line, never a failed run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use graphex_core::{Config, Extractor};
//!
//! #[tokio::main]
//! async fn main() -> graphex_core::Result<()> {
//!     let extractor = Extractor::new(Config::load()?);
//!     let manifest = extractor.extract_file("./report.pdf".as_ref()).await?;
//!     println!("{} images, {} errors", manifest.entries.len(), manifest.errors.len());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

#[cfg(test)]
mod testing;

use std::path::Path;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, DocumentError, GraphexError, ObjectError, ObjectFailure, ObjectResult, Result,
};
pub use output::{write_outputs, OutputFormat, OutputWriter, WrittenFiles};
pub use pipeline::{Manifest, ManifestAssembler, ObjectOutcome, ObjectProcessor};
pub use types::{
    AnalysisResult, ColorSpace, ImageObject, ManifestEntry, MimeType, Orientation, StreamFilter,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extractor - the main entry point for pulling images out of a document.
pub struct Extractor {
    config: Config,
    assembler: ManifestAssembler,
}

impl Extractor {
    /// Create a new extractor with the given configuration.
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing Graphex v{}", VERSION);
        let assembler = ManifestAssembler::new(&config);
        Self { config, assembler }
    }

    /// Create a new extractor with the configuration from disk.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(Config::load()?))
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate and read a document within the configured limits.
    pub fn read_document(&self, path: &Path) -> Result<Vec<u8>> {
        let validator = pipeline::Validator::new(self.config.limits.clone());
        Ok(validator.read_document(path)?)
    }

    /// Locate every image object in `bytes`, ordered by object number.
    pub fn scan(&self, bytes: &[u8]) -> Result<Vec<ImageObject>> {
        Ok(pipeline::scan_document(bytes)?)
    }

    /// Scan and process a whole document held in memory.
    pub async fn extract(&self, bytes: &[u8]) -> Result<Manifest> {
        self.extract_with_progress(bytes, |_| {}, |_| {}).await
    }

    /// Like [`extract`](Self::extract), reporting the object count once the
    /// scan finishes and then every per-object outcome.
    pub async fn extract_with_progress<S, F>(
        &self,
        bytes: &[u8],
        on_scanned: S,
        on_result: F,
    ) -> Result<Manifest>
    where
        S: FnOnce(usize),
        F: FnMut(&ObjectOutcome),
    {
        let start = std::time::Instant::now();
        let objects = self.scan(bytes)?;
        tracing::debug!(
            "Found {} image objects in {:?}",
            objects.len(),
            start.elapsed()
        );
        on_scanned(objects.len());

        let manifest = self
            .assembler
            .assemble_with_progress(objects, on_result)
            .await;
        tracing::debug!(
            "Assembled {} entries, {} errors in {:?}",
            manifest.entries.len(),
            manifest.errors.len(),
            start.elapsed()
        );
        Ok(manifest)
    }

    /// Read a document from disk and extract it.
    pub async fn extract_file(&self, path: &Path) -> Result<Manifest> {
        let bytes = self.read_document(path)?;
        self.extract(&bytes).await
    }
}
