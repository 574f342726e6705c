//! Image encoding: `RgbImage` → PNG bytes, and PNG bytes → base64.
//!
//! PNG keeps rendered text lossless. Rasters are RGB without an alpha
//! channel, so the encoded file is RGB8 as well.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as PNG.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Standard (padded) base64, as embedded in JSON responses.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
