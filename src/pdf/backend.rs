//! Document backend boundary
//!
//! A backend is an opened document exposing per-page primitives. Page
//! indices are 0-based; every method may fail with [`Error::Extraction`].
//!
//! [`Error::Extraction`]: crate::Error::Extraction

use super::bitmap::{ImageRef, Pixmap};
use super::link::LinkRecord;
use super::table::TableGrid;
use super::types::{Annotation, Metadata};
use crate::error::Result;

pub trait DocumentBackend {
    fn page_count(&self) -> Result<u32>;

    /// Document-level information dictionary
    fn metadata(&self) -> Result<Metadata>;

    /// Raw text of a page. Usually UTF-8, but not guaranteed to be well formed.
    fn page_text(&self, page_index: u32) -> Result<Vec<u8>>;

    /// Images embedded in a page, in discovery order
    fn image_refs(&self, page_index: u32) -> Result<Vec<ImageRef>>;

    fn extract_image(&self, page_index: u32, image: &ImageRef) -> Result<Pixmap>;

    /// Tables detected on a page, in detection order
    fn find_tables(&self, page_index: u32) -> Result<Vec<TableGrid>>;

    fn links(&self, page_index: u32) -> Result<Vec<LinkRecord>>;

    fn annotations(&self, page_index: u32) -> Result<Vec<Annotation>>;
}

impl<B: DocumentBackend + ?Sized> DocumentBackend for Box<B> {
    fn page_count(&self) -> Result<u32> {
        (**self).page_count()
    }

    fn metadata(&self) -> Result<Metadata> {
        (**self).metadata()
    }

    fn page_text(&self, page_index: u32) -> Result<Vec<u8>> {
        (**self).page_text(page_index)
    }

    fn image_refs(&self, page_index: u32) -> Result<Vec<ImageRef>> {
        (**self).image_refs(page_index)
    }

    fn extract_image(&self, page_index: u32, image: &ImageRef) -> Result<Pixmap> {
        (**self).extract_image(page_index, image)
    }

    fn find_tables(&self, page_index: u32) -> Result<Vec<TableGrid>> {
        (**self).find_tables(page_index)
    }

    fn links(&self, page_index: u32) -> Result<Vec<LinkRecord>> {
        (**self).links(page_index)
    }

    fn annotations(&self, page_index: u32) -> Result<Vec<Annotation>> {
        (**self).annotations(page_index)
    }
}
