//! Manifest and error-log output.
//!
//! [`OutputWriter`] serializes items as a JSON array or JSON Lines;
//! [`write_outputs`] lays a finished [`Manifest`] out on disk.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::pipeline::Manifest;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// A writer that serializes items to JSON or JSONL format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// `pretty` only affects the JSON format; JSONL is always one line per item.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write all items: a JSON array, or one object per line.
    ///
    /// An empty slice still produces `[]` in JSON format.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, items)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, items).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            OutputFormat::JsonLines => {
                for item in items {
                    serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
                    writeln!(self.writer)?;
                }
            }
        }
        self.items_written += items.len();
        Ok(())
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Paths produced by [`write_outputs`].
#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub manifest: PathBuf,
    /// Present only when the run had errors
    pub errors: Option<PathBuf>,
    /// Standalone image files, when requested
    pub images: Vec<PathBuf>,
}

/// Write the manifest (and the error log, if any) under `dir`.
///
/// A stale error log from an earlier run is removed when this run is clean.
/// With `write_images`, every payload is also written as `dir/<name>`.
pub fn write_outputs(
    dir: &Path,
    manifest: &Manifest,
    config: &OutputConfig,
    format: OutputFormat,
    write_images: bool,
) -> io::Result<WrittenFiles> {
    std::fs::create_dir_all(dir)?;

    let manifest_path = dir.join(&config.manifest_file);
    let file = File::create(&manifest_path)?;
    let mut writer = OutputWriter::new(BufWriter::new(file), format, config.pretty);
    writer.write_all(&manifest.entries)?;
    writer.flush()?;
    tracing::debug!(
        "Wrote {} manifest entries to {:?}",
        writer.items_written(),
        manifest_path
    );

    let error_path = dir.join(&config.error_file);
    let errors = if manifest.errors.is_empty() {
        if error_path.exists() {
            std::fs::remove_file(&error_path)?;
            tracing::debug!("Removed stale error log {:?}", error_path);
        }
        None
    } else {
        let mut log = String::new();
        for line in manifest.error_lines() {
            log.push_str(&line);
            log.push('\n');
        }
        std::fs::write(&error_path, log)?;
        Some(error_path)
    };

    let mut images = Vec::new();
    if write_images {
        for entry in &manifest.entries {
            let bytes = BASE64
                .decode(&entry.base64)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let path = dir.join(&entry.name);
            std::fs::write(&path, bytes)?;
            images.push(path);
        }
    }

    Ok(WrittenFiles {
        manifest: manifest_path,
        errors,
        images,
    })
}
