//! PDF output: one full-bleed label image per page.

mod content;
mod document;
mod resources;

pub use document::export_pdf;

#[cfg(test)]
pub(crate) use document::page_image;
