//! Configuration loading and parsing.
//!
//! This module handles:
//! - The label layout (geometry, fonts, colors) with compiled-in defaults
//! - Loading a layout override from a JSON file
//! - Loading a batch of label requests from CSV
//! - Unit conversion between millimetres, points and pixels

use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use image::Rgb;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::label::LabelRequest;

/// Printed side of every label page.
pub const PAGE_SIZE_MM: f64 = 100.0;

/// Raster resolution of a label; 100 mm at 300 DPI is 1181 px.
pub const LABEL_DPI: u32 = 300;

/// A physical length, stored in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension(pub f64);

impl Dimension {
    pub fn from_mm(mm: f64) -> Self {
        Dimension(mm * 72.0 / 25.4)
    }

    /// Convert to points (internal PDF unit)
    pub fn as_points(&self) -> f64 {
        self.0
    }

    /// Size in raster pixels at the given resolution, rounded to the nearest pixel.
    pub fn as_pixels(&self, dpi: u32) -> u32 {
        (self.0 / 72.0 * dpi as f64).round().max(1.0) as u32
    }
}

/// An sRGB color written as `#rrggbb` in layout files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(pub Rgb<u8>);

impl HexColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        HexColor(Rgb([r, g, b]))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(anyhow!("invalid color: {}", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| anyhow!("invalid color: {}", s))
        };
        Ok(HexColor::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HexColor::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Geometry and styling of a label. Pixel values are raster pixels at [`LABEL_DPI`].
///
/// The page size is fixed; layout files may only tune what is drawn on it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelLayout {
    /// System font family name, or a path to a font file.
    pub font: String,
    pub caption_font_size: f32,
    pub value_font_size: f32,
    pub qr_size: u32,
    pub qr_module_px: u32,
    pub qr_border_modules: u32,
    pub username_offset: i64,
    pub password_offset: i64,
    /// Vertical shift applied to the password QR code and value.
    pub password_shift: i64,
    pub caption_gap: i64,
    pub value_gap: i64,
    pub preview_size: u32,
    pub caption_color: HexColor,
    pub value_color: HexColor,
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            font: "Arial".to_string(),
            caption_font_size: 30.0,
            value_font_size: 45.0,
            qr_size: 400,
            qr_module_px: 12,
            qr_border_modules: 1,
            username_offset: 100,
            password_offset: 640,
            password_shift: -20,
            caption_gap: 40,
            value_gap: 460,
            preview_size: 350,
            caption_color: HexColor::new(0x94, 0xa3, 0xb8),
            value_color: HexColor::new(0x33, 0x41, 0x55),
        }
    }
}

impl LabelLayout {
    pub fn page_size(&self) -> Dimension {
        Dimension::from_mm(PAGE_SIZE_MM)
    }

    /// Side of the square label raster in pixels.
    pub fn canvas_px(&self) -> u32 {
        self.page_size().as_pixels(LABEL_DPI)
    }
}

/// Helper function to open a file with consistent error context
fn open_file_with_context(path: &Path, description: &str) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open {} at {:?}", description, path))
}

pub fn load_layout(path: &Path) -> Result<LabelLayout> {
    let file = open_file_with_context(path, "layout file")?;
    let reader = BufReader::new(file);
    let layout: LabelLayout = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse layout file {:?}", path))?;
    if layout.qr_size == 0 || layout.preview_size == 0 {
        return Err(anyhow!("Layout sizes must be positive in {:?}", path));
    }
    Ok(layout)
}

/// Read `username,password` rows. Extra columns are ignored.
///
/// Fields are taken verbatim: spaces inside a password are part of it.
pub fn load_batch_csv(path: &Path) -> Result<Vec<LabelRequest>> {
    let file = open_file_with_context(path, "batch CSV")?;
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(file);

    let mut requests = Vec::new();
    for (line, result) in rdr.deserialize::<LabelRequest>().enumerate() {
        let request = result.with_context(|| format!("Invalid row {} in {:?}", line + 1, path))?;
        requests.push(request);
    }
    Ok(requests)
}
