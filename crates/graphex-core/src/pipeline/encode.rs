//! Minimal PNG writer for 8-bit gray and RGB samples.
//!
//! Output is signature + IHDR + one IDAT + IEND. Every scanline uses filter
//! type 0 (None), so identical input always yields identical bytes.

use flate2::write::ZlibEncoder;
use flate2::{Compression, Crc};
use std::io::Write;

use crate::config::EncodingConfig;
use crate::error::{ObjectError, ObjectResult};
use crate::types::sample_len;

/// Fixed 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Largest width or height PNG allows (2^31 - 1).
pub const PNG_MAX_DIMENSION: u32 = i32::MAX as u32;

const COLOR_TYPE_GRAY: u8 = 0;
const COLOR_TYPE_RGB: u8 = 2;

/// Re-encodes decoded samples as PNG.
pub struct PngEncoder {
    config: EncodingConfig,
}

impl PngEncoder {
    pub fn new(config: EncodingConfig) -> Self {
        Self { config }
    }

    /// Encode `pixels` (exactly `width * height * channels` bytes).
    pub fn encode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        channels: usize,
    ) -> ObjectResult<Vec<u8>> {
        let color_type = match channels {
            1 => COLOR_TYPE_GRAY,
            3 => COLOR_TYPE_RGB,
            n => return Err(ObjectError::UnsupportedColorSpace(format!("{n}-channel"))),
        };
        if width == 0 || height == 0 || width > PNG_MAX_DIMENSION || height > PNG_MAX_DIMENSION {
            return Err(ObjectError::InvalidDimensions {
                width,
                height,
                max_dim: PNG_MAX_DIMENSION,
            });
        }

        let too_large = ObjectError::InvalidDimensions {
            width,
            height,
            max_dim: PNG_MAX_DIMENSION,
        };
        let stride = sample_len(width, 1, channels).ok_or(too_large.clone())?;
        let expected = sample_len(width, height, channels).ok_or(too_large)?;
        if pixels.len() != expected {
            return Err(ObjectError::SizeMismatch {
                actual: pixels.len(),
                expected,
            });
        }

        let mut filtered = Vec::with_capacity(expected + height as usize);
        for row in pixels.chunks_exact(stride) {
            filtered.push(0);
            filtered.extend_from_slice(row);
        }
        let idat = self.compress(&filtered)?;

        let mut ihdr = Vec::with_capacity(13);
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        // bit depth, color type, compression, filter, interlace
        ihdr.extend_from_slice(&[8, color_type, 0, 0, 0]);

        let mut png = Vec::with_capacity(PNG_SIGNATURE.len() + idat.len() + 64);
        png.extend_from_slice(&PNG_SIGNATURE);
        write_chunk(&mut png, b"IHDR", &ihdr)?;
        write_chunk(&mut png, b"IDAT", &idat)?;
        write_chunk(&mut png, b"IEND", &[])?;
        Ok(png)
    }

    fn compress(&self, data: &[u8]) -> ObjectResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(data.len() / 2),
            Compression::new(self.config.compression_level),
        );
        encoder
            .write_all(data)
            .map_err(|e| ObjectError::Compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| ObjectError::Compression(e.to_string()))
    }
}

/// Append one length / tag / payload / CRC-32 framed chunk.
fn write_chunk(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) -> ObjectResult<()> {
    let length = u32::try_from(payload.len()).map_err(|_| {
        ObjectError::Compression(format!(
            "{} chunk of {} bytes exceeds PNG limit",
            String::from_utf8_lossy(tag),
            payload.len()
        ))
    })?;

    let mut crc = Crc::new();
    crc.update(tag);
    crc.update(payload);

    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(payload);
    out.extend_from_slice(&crc.sum().to_be_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    struct Chunk {
        tag: [u8; 4],
        payload: Vec<u8>,
        crc: u32,
    }

    fn chunks(png: &[u8]) -> Vec<Chunk> {
        assert_eq!(&png[..8], &PNG_SIGNATURE);
        let mut out = Vec::new();
        let mut pos = 8;
        while pos < png.len() {
            let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
            let tag: [u8; 4] = png[pos + 4..pos + 8].try_into().unwrap();
            let payload = png[pos + 8..pos + 8 + len].to_vec();
            let crc = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());
            out.push(Chunk { tag, payload, crc });
            pos += 12 + len;
        }
        out
    }

    fn encoder() -> PngEncoder {
        PngEncoder::new(EncodingConfig::default())
    }

    #[test]
    fn test_chunk_layout_and_header() {
        let png = encoder().encode(&[0, 0, 0, 0], 2, 2, 1).unwrap();
        let chunks = chunks(&png);

        let tags: Vec<&[u8; 4]> = chunks.iter().map(|c| &c.tag).collect();
        assert_eq!(tags, vec![b"IHDR", b"IDAT", b"IEND"]);

        let ihdr = &chunks[0].payload;
        assert_eq!(ihdr.len(), 13);
        assert_eq!(&ihdr[0..4], &2u32.to_be_bytes());
        assert_eq!(&ihdr[4..8], &2u32.to_be_bytes());
        assert_eq!(&ihdr[8..], &[8, 0, 0, 0, 0]);

        assert!(chunks[2].payload.is_empty());
        // Well-known CRC of an empty IEND chunk.
        assert_eq!(chunks[2].crc, 0xAE42_6082);
    }

    #[test]
    fn test_rgb_color_type() {
        let png = encoder().encode(&[255, 0, 0, 0, 255, 0], 2, 1, 3).unwrap();
        assert_eq!(chunks(&png)[0].payload[9], 2);
    }

    #[test]
    fn test_crc_covers_tag_and_payload() {
        let png = encoder().encode(&[1, 2, 3], 1, 1, 3).unwrap();
        for chunk in chunks(&png) {
            let mut crc = Crc::new();
            crc.update(&chunk.tag);
            crc.update(&chunk.payload);
            assert_eq!(crc.sum(), chunk.crc);
        }
    }

    #[test]
    fn test_idat_inflates_to_filtered_rows() {
        let pixels: Vec<u8> = (0..24).collect();
        let png = encoder().encode(&pixels, 4, 2, 3).unwrap();
        let idat = &chunks(&png)[1].payload;

        let mut raw = Vec::new();
        ZlibDecoder::new(&idat[..]).read_to_end(&mut raw).unwrap();
        assert_eq!(raw.len(), 2 * (1 + 12));

        let mut unfiltered = Vec::new();
        for row in raw.chunks_exact(13) {
            assert_eq!(row[0], 0);
            unfiltered.extend_from_slice(&row[1..]);
        }
        assert_eq!(unfiltered, pixels);
    }

    #[test]
    fn test_decodes_with_independent_png_reader() {
        let pixels: Vec<u8> = (0..5 * 3 * 3).map(|i| (i * 7 % 256) as u8).collect();
        let png = encoder().encode(&pixels, 5, 3, 3).unwrap();
        let decoded = image::load_from_memory_with_format(&png, image::ImageFormat::Png).unwrap();
        assert_eq!(decoded.width(), 5);
        assert_eq!(decoded.height(), 3);
        assert_eq!(decoded.to_rgb8().into_raw(), pixels);

        let gray: Vec<u8> = (0..12).map(|i| i * 20).collect();
        let png = encoder().encode(&gray, 4, 3, 1).unwrap();
        let decoded = image::load_from_memory_with_format(&png, image::ImageFormat::Png).unwrap();
        assert_eq!(decoded.to_luma8().into_raw(), gray);
    }

    #[test]
    fn test_output_is_deterministic() {
        let pixels = vec![42u8; 300];
        assert_eq!(
            encoder().encode(&pixels, 10, 10, 3).unwrap(),
            encoder().encode(&pixels, 10, 10, 3).unwrap()
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            encoder().encode(&[0; 4], 2, 2, 4),
            Err(ObjectError::UnsupportedColorSpace(_))
        ));
        assert!(matches!(
            encoder().encode(&[], 0, 2, 1),
            Err(ObjectError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            encoder().encode(&[0; 3], 2, 2, 1),
            Err(ObjectError::SizeMismatch {
                actual: 3,
                expected: 4
            })
        ));
    }
}
