//! Stream decoding: inflate Flate streams, pass DCT (JPEG) streams through.

use flate2::{Decompress, FlushDecompress, Status};

use crate::config::LimitsConfig;
use crate::error::{ObjectError, ObjectResult};
use crate::types::{ImageObject, StreamFilter};

/// Output of [`StreamDecoder::decode`].
#[derive(Debug, PartialEq)]
pub enum DecodedStream<'a> {
    /// Raw 8-bit samples, row-major, channel-interleaved
    Pixels(Vec<u8>),
    /// Already a standalone JPEG file
    Passthrough(&'a [u8]),
}

/// Decodes image object streams with a bound on decompressed size.
pub struct StreamDecoder {
    limits: LimitsConfig,
}

impl StreamDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an object's stream according to its filter.
    pub fn decode<'a>(&self, image: &'a ImageObject) -> ObjectResult<DecodedStream<'a>> {
        match &image.filter {
            StreamFilter::Flate => self.inflate(&image.raw_stream).map(DecodedStream::Pixels),
            StreamFilter::Dct => Ok(DecodedStream::Passthrough(&image.raw_stream)),
            other => Err(ObjectError::UnsupportedEncoding(other.to_string())),
        }
    }

    /// Inflate a zlib stream. Corrupt or truncated input is an error; no
    /// partial output is ever returned.
    pub fn inflate(&self, data: &[u8]) -> ObjectResult<Vec<u8>> {
        let limit = usize::try_from(self.limits.max_decoded_bytes()).unwrap_or(usize::MAX);
        // One byte past the limit is enough to detect an oversized stream.
        let ceiling = limit.saturating_add(1);
        let mut inflater = Decompress::new(true);
        let mut decoded =
            Vec::with_capacity(data.len().saturating_mul(4).clamp(64, 1 << 20).min(ceiling));

        loop {
            if decoded.len() == decoded.capacity() {
                let headroom = ceiling - decoded.len();
                decoded.reserve_exact(decoded.capacity().min(headroom).max(1));
            }
            let consumed = inflater.total_in() as usize;
            let produced = decoded.len();

            let status = inflater
                .decompress_vec(&data[consumed..], &mut decoded, FlushDecompress::None)
                .map_err(|e| ObjectError::Decompression(e.to_string()))?;

            if decoded.len() > limit {
                return Err(ObjectError::Decompression(format!(
                    "decoded stream exceeds {}MB limit",
                    self.limits.max_decoded_mb
                )));
            }

            match status {
                Status::StreamEnd => return Ok(decoded),
                Status::Ok | Status::BufError => {
                    // Input exhausted with room to spare and no end marker.
                    let stalled =
                        inflater.total_in() as usize == consumed && decoded.len() == produced;
                    if stalled && decoded.len() < decoded.capacity() {
                        return Err(ObjectError::Decompression(
                            "unexpected end of deflate stream".to_string(),
                        ));
                    }
                }
            }
        }
    }
}
