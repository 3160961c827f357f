//! Fixtures for unit tests: a tiny PDF writer and zlib helper.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Compress `data` the way a PDF producer would for `/FlateDecode`.
pub(crate) fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Run `f` with a subscriber that records `warn!` and above, returning the text.
pub(crate) fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (value, text)
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Builds a byte buffer shaped like a PDF body.
pub(crate) struct PdfBuilder {
    buf: Vec<u8>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            buf: b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec(),
        }
    }

    /// Append an object whose dictionary is `dict` verbatim, with an optional
    /// stream. No `/Length` is added.
    pub fn raw(mut self, number: u32, dict: &str, stream: Option<&[u8]>) -> Self {
        self.buf
            .extend_from_slice(format!("{number} 0 obj\n<< {dict} >>\n").as_bytes());
        if let Some(data) = stream {
            self.buf.extend_from_slice(b"stream\r\n");
            self.buf.extend_from_slice(data);
            self.buf.extend_from_slice(b"\r\nendstream\n");
        }
        self.buf.extend_from_slice(b"endobj\n");
        self
    }

    /// Append an image XObject with a correct `/Length`.
    pub fn image(
        self,
        number: u32,
        width: u32,
        height: u32,
        color_space: &str,
        filter: &str,
        data: &[u8],
    ) -> Self {
        let dict = format!(
            "/Type /XObject /Subtype /Image /Width {width} /Height {height} \
             /ColorSpace {color_space} /BitsPerComponent 8 /Filter {filter} /Length {}",
            data.len()
        );
        self.raw(number, &dict, Some(data))
    }

    /// Append a Flate image from raw 8-bit samples.
    pub fn flate_image(self, number: u32, width: u32, height: u32, gray: bool, pixels: &[u8]) -> Self {
        let color_space = if gray { "/DeviceGray" } else { "/DeviceRGB" };
        self.image(number, width, height, color_space, "/FlateDecode", &zlib(pixels))
    }

    pub fn build(mut self) -> Vec<u8> {
        self.buf.extend_from_slice(b"trailer\n<< /Root 1 0 R >>\n%%EOF\n");
        self.buf
    }
}
