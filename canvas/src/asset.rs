//! Image asset intake and `data:` URI handling.
//!
//! DESIGN
//! ======
//! Uploads are validated before any element exists: a disallowed MIME type,
//! an empty payload or an oversized payload is rejected outright. Accepted
//! images wider or taller than the configured maximum are downscaled; if the
//! bytes cannot be decoded (or re-encoded) the original bytes are kept so the
//! upload still succeeds, just without a known natural size.

#[cfg(test)]
#[path = "asset_test.rs"]
mod asset_test;

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

use crate::config::{ALLOWED_IMAGE_TYPES, EditorConfig};

const JPEG_UPLOAD_QUALITY: u8 = 90;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),
    #[error("image too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
    #[error("empty image payload")]
    Empty,
    #[error("not a base64 data uri")]
    InvalidDataUri,
}

/// An upload ready to become an image element.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub data_uri: String,
    /// Pixel size after any downscale; `None` when the bytes could not be decoded.
    pub natural_size: Option<(u32, u32)>,
}

/// Encode raw bytes as a base64 `data:` URI.
#[must_use]
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}

/// Split a base64 `data:` URI into its MIME type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), AssetError> {
    let rest = uri.strip_prefix("data:").ok_or(AssetError::InvalidDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(AssetError::InvalidDataUri)?;
    let mime = header.strip_suffix(";base64").ok_or(AssetError::InvalidDataUri)?;
    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|_| AssetError::InvalidDataUri)?;
    Ok((mime.to_owned(), bytes))
}

/// Validate and normalize an uploaded image.
pub fn prepare_upload(mime: &str, bytes: &[u8], config: &EditorConfig) -> Result<PreparedImage, AssetError> {
    let mime = mime.trim().to_ascii_lowercase();
    if !ALLOWED_IMAGE_TYPES.contains(&mime.as_str()) {
        warn!(%mime, "asset: rejected unsupported type");
        return Err(AssetError::UnsupportedType(mime));
    }
    if bytes.is_empty() {
        warn!(%mime, "asset: rejected empty payload");
        return Err(AssetError::Empty);
    }
    if bytes.len() > config.max_image_bytes {
        warn!(%mime, size = bytes.len(), max = config.max_image_bytes, "asset: rejected oversized payload");
        return Err(AssetError::TooLarge { size: bytes.len(), max: config.max_image_bytes });
    }

    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!(error = %e, %mime, "asset: decode failed; keeping original bytes");
            return Ok(PreparedImage { data_uri: encode_data_uri(&mime, bytes), natural_size: None });
        }
    };

    let limit = config.max_image_dimension;
    if img.width() <= limit && img.height() <= limit {
        return Ok(PreparedImage {
            data_uri: encode_data_uri(&mime, bytes),
            natural_size: Some((img.width(), img.height())),
        });
    }

    let scaled = img.resize(limit, limit, FilterType::Triangle);
    match encode_downscaled(&scaled, &mime) {
        Ok((out_mime, out)) => {
            debug!(
                from_w = img.width(),
                from_h = img.height(),
                to_w = scaled.width(),
                to_h = scaled.height(),
                "asset: downscaled upload"
            );
            Ok(PreparedImage {
                data_uri: encode_data_uri(out_mime, &out),
                natural_size: Some((scaled.width(), scaled.height())),
            })
        }
        Err(e) => {
            warn!(error = %e, %mime, "asset: re-encode failed; keeping original bytes");
            Ok(PreparedImage {
                data_uri: encode_data_uri(&mime, bytes),
                natural_size: Some((img.width(), img.height())),
            })
        }
    }
}

fn encode_downscaled(img: &DynamicImage, mime: &str) -> Result<(&'static str, Vec<u8>), image::ImageError> {
    let mut out = Vec::new();
    if mime == "image/jpeg" || mime == "image/jpg" {
        let rgb = img.to_rgb8();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_UPLOAD_QUALITY);
        encoder.encode_image(&rgb)?;
        return Ok(("image/jpeg", out));
    }
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(("image/png", out))
}
