//! Document validation and the single upfront read.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::DocumentError;

/// PDF header marker. Producers may put junk before it, so it is searched
/// for in the first kilobyte rather than required at offset 0.
const PDF_MAGIC: &[u8] = b"%PDF-";
const HEADER_WINDOW: usize = 1024;

/// Validates and loads documents before scanning.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check the document exists and is within the size limit, then read it.
    ///
    /// A missing `%PDF-` header is only warned about: the scanner works on any
    /// buffer with object delimiters.
    pub fn read_document(&self, path: &Path) -> Result<Vec<u8>, DocumentError> {
        if !path.exists() {
            return Err(DocumentError::FileNotFound(path.to_path_buf()));
        }

        let read_error = |source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        };

        let metadata = std::fs::metadata(path).map_err(read_error)?;
        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(DocumentError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let mut bytes = Vec::with_capacity(metadata.len() as usize);
        std::fs::File::open(path)
            .and_then(|mut file| file.read_to_end(&mut bytes))
            .map_err(read_error)?;

        if !Self::has_pdf_header(&bytes) {
            tracing::warn!("{:?} has no %PDF- header; scanning anyway", path);
        }
        Ok(bytes)
    }

    /// Whether the buffer starts with (or shortly contains) a PDF header.
    pub fn has_pdf_header(bytes: &[u8]) -> bool {
        let window = &bytes[..bytes.len().min(HEADER_WINDOW)];
        window
            .windows(PDF_MAGIC.len())
            .any(|candidate| candidate == PDF_MAGIC)
    }
}
