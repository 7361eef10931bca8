//! QR code PNG synthesis.

use std::io::Cursor;

use image::Luma;
use qrcode::QrCode;

use crate::error::{MediaError, MediaResult};

/// Minimum rendered size; the overlay scales it down to 250x250.
const MIN_DIMENSIONS: u32 = 500;

/// Encode a payload into a PNG QR code.
///
/// The output is a pure function of the payload, so regenerating a
/// preview for the same destination produces an identical image.
pub fn qr_png(payload: &str) -> MediaResult<Vec<u8>> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| MediaError::qr_encode(format!("{} ({} bytes)", e, payload.len())))?;

    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_DIMENSIONS, MIN_DIMENSIONS)
        .build();

    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img).write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}
