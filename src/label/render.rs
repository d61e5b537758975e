use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::warn;

use super::qr::generate_qr_code;
use super::{LabelImage, TextFont, display_text, qr_payload};
use crate::config::LabelLayout;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Renders label images for a fixed layout.
///
/// The font is resolved once on construction; every call to [`render`]
/// produces a fresh image.
///
/// [`render`]: LabelRenderer::render
#[derive(Debug)]
pub struct LabelRenderer {
    layout: LabelLayout,
    font: TextFont,
}

impl LabelRenderer {
    pub fn new(layout: LabelLayout) -> Self {
        let font = TextFont::load(&layout.font);
        Self::with_font(layout, font)
    }

    pub fn with_font(layout: LabelLayout, font: TextFont) -> Self {
        Self { layout, font }
    }

    pub fn layout(&self) -> &LabelLayout {
        &self.layout
    }

    /// Render both sections. Total over all inputs, including empty strings.
    pub fn render(&self, username: &str, password: &str) -> LabelImage {
        let size = self.layout.canvas_px();
        let mut img = RgbImage::from_pixel(size, size, WHITE);

        self.draw_section(&mut img, username, "USERNAME", self.layout.username_offset, 0);
        self.draw_section(
            &mut img,
            password,
            "PASSWORD",
            self.layout.password_offset,
            self.layout.password_shift,
        );

        LabelImage(img)
    }

    fn draw_section(&self, img: &mut RgbImage, value: &str, caption: &str, offset: i64, shift: i64) {
        let layout = &self.layout;
        let center = (img.width() / 2) as i64;

        // The QR goes down first so its white border never covers text.
        match generate_qr_code(
            qr_payload(value),
            layout.qr_size,
            layout.qr_module_px,
            layout.qr_border_modules,
        ) {
            Ok(qr) => {
                let qr = image::DynamicImage::ImageLuma8(qr).to_rgb8();
                let left = center - (layout.qr_size / 2) as i64;
                imageops::overlay(img, &qr, left, offset + layout.caption_gap + shift);
            }
            Err(e) => warn!(caption, error = %e, "QR code skipped"),
        }

        self.font.draw_centered(
            img,
            caption,
            layout.caption_font_size,
            center,
            offset,
            layout.caption_color.0,
        );
        self.font.draw_centered(
            img,
            display_text(value),
            layout.value_font_size,
            center,
            offset + layout.value_gap + shift,
            layout.value_color.0,
        );
    }
}

/// Downscale a label to the on-screen preview square.
pub fn preview(label: &LabelImage, side: u32) -> RgbImage {
    imageops::resize(label.as_rgb(), side, side, FilterType::Lanczos3)
}
