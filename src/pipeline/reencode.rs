//! Image re-encoding: staged PNG → bytes ready to embed as a PDF image XObject.
//!
//! PDF viewers can decode JPEG (`/DCTDecode`) and zlib (`/FlateDecode`)
//! streams natively, so the embedded bytes are exactly what the chosen
//! [`EmbedCodec`] produces; no PNG container ever ends up inside the PDF.
//!
//! Both codecs drop the alpha channel: a rendered page is opaque, and neither
//! `/DeviceRGB` JPEG nor raw RGB samples can carry alpha without an extra
//! soft-mask object.
//!
//! Re-encoding is deterministic. The same image through the same codec yields
//! the same bytes, so two runs over the same input produce identical output.

use crate::config::EmbedCodec;
use crate::error::RerasterError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// A page image in its embedded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    /// Stream bytes, already compressed with `filter`.
    pub data: Vec<u8>,
    /// PDF filter name without the leading slash.
    pub filter: &'static str,
}

/// Read a staged image from disk and re-encode it.
pub fn reencode_file(
    path: &Path,
    page_num: usize,
    codec: EmbedCodec,
) -> Result<EmbeddedImage, RerasterError> {
    let bytes = std::fs::read(path).map_err(|e| RerasterError::ImageDecodeFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let img = image::load_from_memory(&bytes).map_err(|e| RerasterError::ImageDecodeFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    reencode_image(&img, page_num, codec)
}

/// Re-encode an in-memory image with `codec`.
pub fn reencode_image(
    img: &DynamicImage,
    page_num: usize,
    codec: EmbedCodec,
) -> Result<EmbeddedImage, RerasterError> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let data = match codec {
        EmbedCodec::Jpeg { quality } => {
            let mut buf = Vec::new();
            JpegEncoder::new_with_quality(&mut buf, quality)
                .encode_image(&rgb)
                .map_err(|e| RerasterError::ImageEncodeFailed {
                    page: page_num,
                    detail: e.to_string(),
                })?;
            buf
        }
        EmbedCodec::Lossless => {
            zlib_compress(rgb.as_raw()).map_err(|e| RerasterError::ImageEncodeFailed {
                page: page_num,
                detail: e.to_string(),
            })?
        }
    };

    debug!(
        "Re-encoded page {} ({}x{}) as {} → {} bytes",
        page_num,
        width,
        height,
        codec,
        data.len()
    );

    Ok(EmbeddedImage {
        width,
        height,
        data,
        filter: codec.pdf_filter(),
    })
}

fn zlib_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
