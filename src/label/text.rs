//! Text drawing with a system font, falling back to a built-in bitmap font.

use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use fontdb::Database;
use image::{Rgb, RgbImage};
use rusttype::{Font, Scale, point};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Font used for captions and values on a label.
pub enum TextFont {
    Outline(Font<'static>),
    /// 8x8 glyphs scaled up to roughly the requested pixel size.
    Bitmap,
}

impl std::fmt::Debug for TextFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextFont::Outline(_) => f.write_str("TextFont::Outline"),
            TextFont::Bitmap => f.write_str("TextFont::Bitmap"),
        }
    }
}

impl TextFont {
    /// Resolve `name` as a font file path or a system font family.
    ///
    /// Never fails: anything that cannot be found or parsed yields the bitmap font.
    pub fn load(name: &str) -> TextFont {
        let loaded = if is_font_path(name) {
            fs::read(name).ok().map(|data| (data, 0))
        } else {
            find_system_font(name)
        };

        match loaded.and_then(|(data, index)| Font::try_from_vec_and_index(data, index)) {
            Some(font) => {
                debug!(font = name, "loaded outline font");
                TextFont::Outline(font)
            }
            None => {
                debug!(font = name, "font unavailable, using bitmap fallback");
                TextFont::Bitmap
            }
        }
    }

    /// Draw `text` centered on (`cx`, `cy`), both horizontally and vertically.
    pub fn draw_centered(&self, img: &mut RgbImage, text: &str, px: f32, cx: i64, cy: i64, color: Rgb<u8>) {
        match self {
            TextFont::Outline(font) => draw_outline(img, font, text, px, cx, cy, color),
            TextFont::Bitmap => draw_bitmap(img, text, px, cx, cy, color),
        }
    }
}

fn is_font_path(name: &str) -> bool {
    let path = Path::new(name);
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| ["ttf", "ttc", "otf"].contains(&e.to_lowercase().as_str()))
}

/// Look a family name up among the platform's font directories.
fn find_system_font(family: &str) -> Option<(Vec<u8>, u32)> {
    let mut db = Database::new();

    if cfg!(target_os = "macos") {
        db.load_system_fonts();
    } else if cfg!(target_os = "windows") {
        if let Ok(windir) = std::env::var("WINDIR") {
            db.load_fonts_dir(Path::new(&windir).join("Fonts"));
        }
    } else {
        for path in ["/usr/share/fonts", "/usr/local/share/fonts"] {
            db.load_fonts_dir(path);
        }
        if let Ok(home) = std::env::var("HOME") {
            for subpath in [".fonts", ".local/share/fonts"] {
                db.load_fonts_dir(Path::new(&home).join(subpath));
            }
        }
    }

    let query = fontdb::Query {
        families: &[fontdb::Family::Name(family)],
        ..Default::default()
    };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| (data.to_vec(), index))
}

/// Blend `color` over the pixel at (`x`, `y`) with coverage `alpha` in 0..=1.
fn blend(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, alpha: f32) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 || alpha <= 0.0 {
        return;
    }
    let alpha = alpha.min(1.0);
    let dst = img.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        dst.0[c] = (color.0[c] as f32 * alpha + dst.0[c] as f32 * (1.0 - alpha)).round() as u8;
    }
}

fn draw_outline(img: &mut RgbImage, font: &Font<'static>, text: &str, px: f32, cx: i64, cy: i64, color: Rgb<u8>) {
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<_> = font.layout(text, scale, point(0.0, 0.0)).collect();
    let width = glyphs
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0);

    // Middle of the ascender/descender band sits on cy.
    let left = cx as f32 - width / 2.0;
    let baseline = cy as f32 + (v_metrics.ascent + v_metrics.descent) / 2.0;

    for glyph in font.layout(text, scale, point(left, baseline)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                blend(img, (bb.min.x + gx as i32) as i64, (bb.min.y + gy as i32) as i64, color, v);
            });
        }
    }
}

fn bitmap_glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn draw_bitmap(img: &mut RgbImage, text: &str, px: f32, cx: i64, cy: i64, color: Rgb<u8>) {
    let cell = ((px / 8.0).round() as i64).max(1);
    let count = text.chars().count() as i64;
    let left = cx - count * 8 * cell / 2;
    let top = cy - 4 * cell;

    for (i, c) in text.chars().enumerate() {
        let origin_x = left + i as i64 * 8 * cell;
        for (row, bits) in bitmap_glyph(c).iter().enumerate() {
            for col in 0..8 {
                // Bit 0 is the leftmost pixel.
                if bits & (1 << col) == 0 {
                    continue;
                }
                for dy in 0..cell {
                    for dx in 0..cell {
                        blend(img, origin_x + col * cell + dx, top + row as i64 * cell + dy, color, 1.0);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const INK: Rgb<u8> = Rgb([0x33, 0x41, 0x55]);

    fn ink_bounds(img: &RgbImage) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, p) in img.enumerate_pixels() {
            if *p != WHITE {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }

    #[test]
    fn test_missing_font_falls_back_to_bitmap() {
        let font = TextFont::load("Definitely Not A Real Font Family 42");
        assert!(matches!(font, TextFont::Bitmap));
    }

    #[test]
    fn test_missing_font_file_falls_back_to_bitmap() {
        let font = TextFont::load("/nonexistent/fonts/arial.ttf");
        assert!(matches!(font, TextFont::Bitmap));
    }

    #[test]
    fn test_bitmap_text_is_centered() {
        let mut img = RgbImage::from_pixel(200, 100, WHITE);
        TextFont::Bitmap.draw_centered(&mut img, "HH", 16.0, 100, 50, INK);
        // Two 8x8 cells at scale 2 cover x 84..=115 and y 42..=57.
        let (x0, y0, x1, y1) = ink_bounds(&img).unwrap();
        assert!(x0 >= 84 && x1 <= 115);
        assert!(y0 >= 42 && y1 <= 57);
    }

    #[test]
    fn test_outline_text_is_centered() {
        let Some(font) = ["DejaVu Sans", "Liberation Sans", "Arial", "Helvetica"]
            .into_iter()
            .map(TextFont::load)
            .find(|font| matches!(font, TextFont::Outline(_)))
        else {
            eprintln!("no outline font installed, skipping");
            return;
        };

        let mut img = RgbImage::from_pixel(1181, 100, WHITE);
        font.draw_centered(&mut img, "USERNAME", 30.0, 590, 50, INK);
        let (x0, y0, x1, y1) = ink_bounds(&img).unwrap();
        let mid_x = (x0 + x1) as i64 / 2;
        let mid_y = (y0 + y1) as i64 / 2;
        assert!((mid_x - 590).abs() <= 3, "horizontal midpoint {}", mid_x);
        assert!((mid_y - 50).abs() <= 8, "vertical midpoint {}", mid_y);
        // Outline glyphs are anti-aliased and far wider than a single cell.
        assert!(x1 - x0 > 100);
    }

    #[test]
    fn test_drawing_outside_canvas_is_clipped() {
        let mut img = RgbImage::from_pixel(10, 10, WHITE);
        TextFont::Bitmap.draw_centered(&mut img, "a very long line of text", 45.0, 5, 5, INK);
        assert_eq!(img.dimensions(), (10, 10));
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let mut img = RgbImage::from_pixel(50, 50, WHITE);
        TextFont::Bitmap.draw_centered(&mut img, "", 30.0, 25, 25, INK);
        assert!(ink_bounds(&img).is_none());
    }

    #[test]
    fn test_font_path_detection() {
        assert!(is_font_path("/usr/share/fonts/DejaVuSans.ttf"));
        assert!(is_font_path("C:\\Windows\\Fonts\\ARIAL.TTF"));
        assert!(!is_font_path("Arial"));
    }
}
