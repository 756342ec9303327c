//! Donation QR-code renderer.
//!
//! Encodes the canonical lookup URL of a donation into a scannable PNG.
//! The matrix is rasterized by hand (10px modules, 4-module quiet zone)
//! so the output does not depend on the qrcode crate's optional image
//! integration.

use std::io::Cursor;

use qrcode::QrCode;

use crate::error::CoreError;
use crate::types::DbId;

/// Pixels per QR module.
const MODULE_SIZE: u32 = 10;

/// Quiet-zone width around the code, in modules.
const QUIET_ZONE: u32 = 4;

/// Build the canonical lookup URL encoded in a donation's QR code.
pub fn donation_url(public_base_url: &str, donation_id: DbId) -> String {
    format!(
        "{}/api/v1/donations/{donation_id}",
        public_base_url.trim_end_matches('/')
    )
}

/// Render a QR code for `url` as PNG bytes (black on white).
pub fn render_qr_png(url: &str) -> Result<Vec<u8>, CoreError> {
    let code = QrCode::new(url.as_bytes())
        .map_err(|e| CoreError::Internal(format!("QR encoding failed: {e}")))?;

    let modules = code.width() as u32;
    let size = (modules + 2 * QUIET_ZONE) * MODULE_SIZE;
    let mut img = image::GrayImage::from_pixel(size, size, image::Luma([255u8]));

    for y in 0..modules {
        for x in 0..modules {
            if code[(x as usize, y as usize)] == qrcode::Color::Dark {
                let px = (x + QUIET_ZONE) * MODULE_SIZE;
                let py = (y + QUIET_ZONE) * MODULE_SIZE;
                for dy in 0..MODULE_SIZE {
                    for dx in 0..MODULE_SIZE {
                        img.put_pixel(px + dx, py + dy, image::Luma([0u8]));
                    }
                }
            }
        }
    }

    let mut bytes = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| CoreError::Internal(format!("PNG encoding failed: {e}")))?;
    Ok(bytes)
}
