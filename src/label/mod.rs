//! Label rendering: two captioned QR codes on a square raster.

mod qr;
mod render;
mod text;

use image::RgbImage;
use serde::Deserialize;

pub use render::{LabelRenderer, preview};
pub use text::TextFont;

/// Shown under a QR code whose field is still empty.
pub const PLACEHOLDER_TEXT: &str = "Waiting...";

/// The two form fields that make up one label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LabelRequest {
    pub username: String,
    pub password: String,
}

impl LabelRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// A rendered label at full print resolution.
#[derive(Debug, Clone)]
pub struct LabelImage(RgbImage);

impl LabelImage {
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.0
    }
}

/// QR payload for a field value; empty values encode a single space.
pub fn qr_payload(value: &str) -> &str {
    if value.is_empty() { " " } else { value }
}

/// Text printed under the QR code for a field value.
pub fn display_text(value: &str) -> &str {
    if value.is_empty() { PLACEHOLDER_TEXT } else { value }
}
