//! Per-object orchestration: decode, analyze, encode, name.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::config::{Config, LimitsConfig};
use crate::error::{ObjectError, ObjectResult};
use crate::types::{ImageObject, ManifestEntry, MimeType, StreamFilter};

use super::analyze::ChannelAnalyzer;
use super::decode::{DecodedStream, StreamDecoder};
use super::encode::PngEncoder;
use super::naming::SemanticNamer;

/// Runs one image object through every stage and builds its manifest entry.
///
/// Holds no per-object state, so one instance is shared by all workers.
pub struct ObjectProcessor {
    decoder: StreamDecoder,
    analyzer: ChannelAnalyzer,
    encoder: PngEncoder,
    namer: SemanticNamer,
    limits: LimitsConfig,
}

impl ObjectProcessor {
    /// Create a new processor with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: StreamDecoder::new(config.limits.clone()),
            analyzer: ChannelAnalyzer::new(config.analysis.clone()),
            encoder: PngEncoder::new(config.encoding.clone()),
            namer: SemanticNamer::new(config.naming.clone()),
            limits: config.limits.clone(),
        }
    }

    /// Process a single image object.
    ///
    /// Flate images are checked (bit depth, color space, dimensions) before
    /// anything is inflated; DCT images are passed through without analysis.
    pub fn process(&self, image: &ImageObject) -> ObjectResult<ManifestEntry> {
        let start = std::time::Instant::now();

        if image.filter == StreamFilter::Flate {
            self.precheck_flate(image)?;
        }

        let (payload, mime, analysis) = match self.decoder.decode(image)? {
            DecodedStream::Pixels(pixels) => {
                let decode_time = start.elapsed();
                tracing::trace!("  obj{} decode: {:?}", image.object_number, decode_time);

                let channels = image.channels()?;
                let analysis =
                    self.analyzer
                        .analyze(&pixels, image.width, image.height, channels)?;
                let png = self
                    .encoder
                    .encode(&pixels, image.width, image.height, channels)?;
                (png, MimeType::Png, Some(analysis))
            }
            DecodedStream::Passthrough(jpeg) => (jpeg.to_vec(), MimeType::Jpeg, None),
        };

        let name = self.namer.name(image, mime, analysis.as_ref());
        tracing::debug!(
            "Processed obj{} in {:?} ({} bytes {})",
            image.object_number,
            start.elapsed(),
            payload.len(),
            mime
        );

        Ok(ManifestEntry {
            name,
            object_number: image.object_number,
            width: image.width,
            height: image.height,
            color_space: image.color_space.to_string(),
            bits_per_component: image.bits_per_component,
            mime,
            base64: BASE64.encode(&payload),
            analysis,
        })
    }

    fn precheck_flate(&self, image: &ImageObject) -> ObjectResult<()> {
        if image.bits_per_component != 8 {
            return Err(ObjectError::UnsupportedBitDepth(image.bits_per_component));
        }
        image.channels()?;

        let max_dim = self.limits.max_image_dimension;
        if image.width == 0 || image.height == 0 || image.width > max_dim || image.height > max_dim
        {
            return Err(ObjectError::InvalidDimensions {
                width: image.width,
                height: image.height,
                max_dim,
            });
        }
        Ok(())
    }
}
