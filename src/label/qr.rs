use anyhow::{Context, Result};
use image::{GrayImage, Luma};
use qrcode::{Color, QrCode};

/// Render `data` as a square QR code image of `size` pixels.
///
/// Modules are drawn `module_px` pixels wide inside a white border of
/// `border_modules`, then scaled with nearest-neighbour to `size`.
pub fn generate_qr_code(data: &str, size: u32, module_px: u32, border_modules: u32) -> Result<GrayImage> {
    let qr_code = QrCode::new(data.as_bytes())
        .with_context(|| format!("Failed to generate QR code for {} bytes of data", data.len()))?;

    let width = qr_code.width() as u32;
    let module_px = module_px.max(1);
    let side = (width + 2 * border_modules) * module_px;
    let mut img = GrayImage::from_pixel(side, side, Luma([255u8]));

    for (index, color) in qr_code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let col = index as u32 % width + border_modules;
        let row = index as u32 / width + border_modules;
        for dy in 0..module_px {
            for dx in 0..module_px {
                img.put_pixel(col * module_px + dx, row * module_px + dy, Luma([0u8]));
            }
        }
    }

    Ok(image::imageops::resize(
        &img,
        size,
        size,
        image::imageops::FilterType::Nearest,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_is_requested_size() {
        let img = generate_qr_code("alice", 400, 12, 1).unwrap();
        assert_eq!(img.dimensions(), (400, 400));
    }

    #[test]
    fn test_qr_has_white_border_and_dark_finder() {
        // Version 1 is 21 modules; with a 1-module border that is 23 * 12 = 276 px
        // before scaling, so render at native size to inspect modules directly.
        let img = generate_qr_code(" ", 276, 12, 1).unwrap();
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        assert_eq!(img.get_pixel(275, 275)[0], 255);
        // Top-left finder pattern starts right after the border.
        assert_eq!(img.get_pixel(12, 12)[0], 0);
        assert_eq!(img.get_pixel(12 + 6 * 12, 12)[0], 0);
    }

    #[test]
    fn test_space_payload_is_encodable() {
        assert!(generate_qr_code(" ", 400, 12, 1).is_ok());
    }

    #[test]
    fn test_oversized_payload_fails() {
        let data = "x".repeat(3000);
        assert!(generate_qr_code(&data, 400, 12, 1).is_err());
    }
}
