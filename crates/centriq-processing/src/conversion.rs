//! Format conversion for uploads.
//!
//! HEIC files are re-encoded as JPEG before upload. Payloads in a HEIF
//! container are decoded with libheif (cargo feature `heic`); anything else,
//! such as a JPEG saved with a `.heic` name, goes through the `image` crate.
//! When decoding fails [`FormatConverter::convert`] reports a
//! `ConversionFailure` and the pipeline uploads the original bytes.

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use centriq_core::models::SourceFile;
use centriq_core::AppError;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::validator::is_heic;

/// `ftyp` brands of HEIF files carrying HEVC-coded images.
const HEIF_BRANDS: [&[u8; 4]; 8] = [
    b"heic", b"heix", b"heim", b"heis", b"hevc", b"hevx", b"mif1", b"msf1",
];

/// True when `data` starts with an ISO-BMFF `ftyp` box whose major or
/// compatible brands name a HEIF image.
pub fn is_heif_container(data: &[u8]) -> bool {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return false;
    }
    let box_len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let end = box_len.clamp(12, data.len());
    let compatible = data.get(16..end).unwrap_or(&[]);

    std::iter::once(&data[8..12])
        .chain(compatible.chunks_exact(4))
        .any(|brand| HEIF_BRANDS.iter().any(|known| &known[..] == brand))
}

fn decode(data: &[u8]) -> anyhow::Result<RgbImage> {
    if is_heif_container(data) {
        return decode_heif(data);
    }
    Ok(image::load_from_memory(data)?.to_rgb8())
}

#[cfg(feature = "heic")]
fn decode_heif(data: &[u8]) -> anyhow::Result<RgbImage> {
    use anyhow::Context;
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(data)
        .map_err(|e| anyhow::anyhow!("invalid HEIF container: {}", e))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| anyhow::anyhow!("HEIF file has no primary image: {}", e))?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| anyhow::anyhow!("HEIF decode failed: {}", e))?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .context("decoded HEIF image has no interleaved RGB plane")?;
    let row_len = plane.width as usize * 3;

    let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
    for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
        let row = row
            .get(..row_len)
            .context("decoded HEIF row is shorter than the image width")?;
        pixels.extend_from_slice(row);
    }

    RgbImage::from_raw(plane.width, plane.height, pixels)
        .context("decoded HEIF plane is smaller than its dimensions")
}

#[cfg(not(feature = "heic"))]
fn decode_heif(_data: &[u8]) -> anyhow::Result<RgbImage> {
    anyhow::bail!("HEIC decoding is not enabled in this build (enable the `heic` feature)")
}

/// Normalizes files the backend cannot display.
#[async_trait]
pub trait FormatConverter: Send + Sync {
    /// Whether `convert` should be attempted for this file.
    fn needs_conversion(&self, file: &SourceFile) -> bool;

    /// Produce the converted file. Errors are `AppError::ConversionFailure`.
    async fn convert(&self, file: &SourceFile) -> Result<SourceFile, AppError>;
}

/// Converts HEIC files to JPEG.
#[derive(Debug, Clone)]
pub struct HeicToJpegConverter {
    quality: u8,
}

impl HeicToJpegConverter {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    fn encode_jpeg(data: &[u8], quality: u8) -> anyhow::Result<Vec<u8>> {
        let rgb = decode(data)?;

        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), quality);
        rgb.write_with_encoder(encoder)?;
        Ok(buffer)
    }
}

impl Default for HeicToJpegConverter {
    fn default() -> Self {
        Self::new(80)
    }
}

#[async_trait]
impl FormatConverter for HeicToJpegConverter {
    fn needs_conversion(&self, file: &SourceFile) -> bool {
        is_heic(file)
    }

    async fn convert(&self, file: &SourceFile) -> Result<SourceFile, AppError> {
        let data = file.data.clone();
        let quality = self.quality;

        let encoded = tokio::task::spawn_blocking(move || Self::encode_jpeg(&data, quality))
            .await
            .map_err(|e| AppError::ConversionFailure {
                filename: file.filename.clone(),
                reason: format!("conversion task failed: {}", e),
            })?
            .map_err(|e| AppError::ConversionFailure {
                filename: file.filename.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            filename = %file.filename,
            original_size = file.size(),
            converted_size = encoded.len(),
            quality,
            "Converted file to JPEG"
        );

        Ok(SourceFile {
            filename: jpeg_filename(&file.filename),
            mime_type: "image/jpeg".to_string(),
            data: Bytes::from(encoded),
        })
    }
}

/// Same base name with the extension replaced by `.jpg`.
pub fn jpeg_filename(filename: &str) -> String {
    Path::new(filename)
        .with_extension("jpg")
        .to_string_lossy()
        .into_owned()
}
