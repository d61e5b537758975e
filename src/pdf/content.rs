//! PDF content stream generation for full-page label images.
//!
//! This module provides:
//! - Raster embedding as compressed image XObjects
//! - Content stream building for image placement

use anyhow::Result;
use image::RgbImage;
use lopdf::{Dictionary, Document, Object, Stream};
use std::io::Write;

/// Builder for a page content stream and the XObjects it references
pub struct ContentBuilder {
    pub content_parts: Vec<String>,
    pub xobjects: Dictionary,
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self {
            content_parts: Vec::new(),
            xobjects: Dictionary::new(),
        }
    }

    /// Embed `image` and draw it into the box at (`x`, `y`) of size `w` x `h` points.
    ///
    /// Coordinates are PDF user space: origin at the bottom-left corner.
    pub fn add_image(
        &mut self,
        image: &RgbImage,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        doc: &mut Document,
    ) -> Result<()> {
        let compressed_bytes = compress_data(image.as_raw())?;

        let mut img_dict = Dictionary::new();
        img_dict.set("Type", "XObject");
        img_dict.set("Subtype", "Image");
        img_dict.set("Width", image.width() as i64);
        img_dict.set("Height", image.height() as i64);
        img_dict.set("ColorSpace", "DeviceRGB");
        img_dict.set("BitsPerComponent", 8_i64);
        img_dict.set("Filter", "FlateDecode");

        let img_id = doc.add_object(Stream::new(img_dict, compressed_bytes));

        let img_name = format!("Im{}", self.xobjects.len());
        self.xobjects.set(img_name.clone(), Object::Reference(img_id));

        self.content_parts.push(format!(
            "q {:.4} 0 0 {:.4} {:.4} {:.4} cm /{} Do Q ",
            w, h, x, y, img_name
        ));

        Ok(())
    }

    /// Build the final content bytes
    pub fn build_content_bytes(&self) -> Vec<u8> {
        self.content_parts.join("").into_bytes()
    }
}

impl Default for ContentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Compress data using zlib/flate2
pub fn compress_data(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use image::Rgb;
    use std::io::Read;

    #[test]
    fn test_content_builder_new() {
        let builder = ContentBuilder::new();
        assert!(builder.content_parts.is_empty());
        assert!(builder.xobjects.is_empty());
    }

    #[test]
    fn test_add_image_places_full_box() {
        let mut doc = Document::with_version("1.5");
        let mut builder = ContentBuilder::new();
        let image = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));

        builder.add_image(&image, 0.0, 0.0, 283.4646, 283.4646, &mut doc).unwrap();

        assert_eq!(builder.xobjects.len(), 1);
        let content = String::from_utf8(builder.build_content_bytes()).unwrap();
        assert_eq!(content, "q 283.4646 0 0 283.4646 0.0000 0.0000 cm /Im0 Do Q ");
    }

    #[test]
    fn test_compress_data_roundtrips() {
        let data = vec![7u8; 1024];
        let compressed = compress_data(&data).unwrap();
        assert!(compressed.len() < data.len());

        let mut out = Vec::new();
        ZlibDecoder::new(&compressed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }
}
