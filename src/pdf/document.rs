use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use tracing::debug;

use super::content::ContentBuilder;
use super::resources::page_resources;
use crate::label::{LabelRenderer, LabelRequest};

/// Create a single page holding the rendered label for one request
fn create_page_for_request(
    doc: &mut Document,
    pages_id: ObjectId,
    request: &LabelRequest,
    renderer: &LabelRenderer,
    page_side: f64,
) -> Result<ObjectId> {
    let label = renderer.render(&request.username, &request.password);

    let mut builder = ContentBuilder::new();
    builder.add_image(label.as_rgb(), 0.0, 0.0, page_side, page_side, doc)?;

    let content_id = doc.add_object(Stream::new(Dictionary::new(), builder.build_content_bytes()));

    let media_box: Vec<Object> = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(page_side as f32),
        Object::Real(page_side as f32),
    ];

    let mut page = Dictionary::new();
    page.set("Type", "Page");
    page.set("Parent", Object::Reference(pages_id));
    page.set("MediaBox", media_box);
    page.set("Contents", Object::Reference(content_id));
    page.set("Resources", Object::Dictionary(page_resources(&builder.xobjects)));

    Ok(doc.add_object(Object::Dictionary(page)))
}

/// Build a document with one square page per request, in order.
///
/// An empty slice yields a document with zero pages.
pub fn create_label_pdf(requests: &[LabelRequest], renderer: &LabelRenderer) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_side = renderer.layout().page_size().as_points();

    let mut kids = Vec::with_capacity(requests.len());
    for (index, request) in requests.iter().enumerate() {
        let page_id = create_page_for_request(&mut doc, pages_id, request, renderer, page_side)
            .with_context(|| format!("Failed to build page {}", index + 1))?;
        kids.push(Object::Reference(page_id));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", "Pages");
    pages.set("Count", kids.len() as i64);
    pages.set("Kids", kids);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", "Catalog");
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    Ok(doc)
}

/// Render `requests` and write them to `path` as a PDF.
pub fn export_pdf(path: &Path, requests: &[LabelRequest], renderer: &LabelRenderer) -> Result<()> {
    let mut doc = create_label_pdf(requests, renderer)?;
    doc.save(path)
        .with_context(|| format!("Failed to write PDF to {:?}", path))?;
    debug!(path = %path.display(), pages = requests.len(), "PDF written");
    Ok(())
}

/// Width, height and inflated RGB bytes of the label image on `page_id`.
///
/// lopdf only decompresses content streams, so the image stream is inflated
/// here directly.
#[cfg(test)]
pub(crate) fn page_image(doc: &Document, page_id: ObjectId) -> (i64, i64, Vec<u8>) {
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
    let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
    let width = stream.dict.get(b"Width").unwrap().as_i64().unwrap();
    let height = stream.dict.get(b"Height").unwrap().as_i64().unwrap();

    let mut pixels = Vec::new();
    ZlibDecoder::new(&stream.content[..]).read_to_end(&mut pixels).unwrap();
    (width, height, pixels)
}
