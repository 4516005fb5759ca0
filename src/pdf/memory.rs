//! In-memory document backend

use super::backend::DocumentBackend;
use super::bitmap::{ImageRef, Pixmap};
use super::link::LinkRecord;
use super::table::TableGrid;
use super::types::{Annotation, Metadata, ViewKind};
use crate::error::{Error, Result};

/// Page content held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    pub text: Vec<u8>,
    pub images: Vec<Pixmap>,
    pub tables: Vec<TableGrid>,
    pub links: Vec<LinkRecord>,
    pub annotations: Vec<Annotation>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into().into_bytes();
        self
    }

    /// Page text as raw bytes, which need not be valid UTF-8
    pub fn with_text_bytes(mut self, text: impl Into<Vec<u8>>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_image(mut self, image: Pixmap) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_table(mut self, table: TableGrid) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_link(mut self, link: LinkRecord) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Document assembled from already extracted page content
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    metadata: Metadata,
    pages: Vec<MemoryPage>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_page(mut self, page: MemoryPage) -> Self {
        self.pages.push(page);
        self
    }

    fn page(&self, view: ViewKind, page_index: u32) -> Result<&MemoryPage> {
        self.pages.get(page_index as usize).ok_or_else(|| {
            Error::extraction(
                view,
                page_index,
                format!("page out of bounds (total: {})", self.pages.len()),
            )
        })
    }
}

impl DocumentBackend for MemoryDocument {
    fn page_count(&self) -> Result<u32> {
        Ok(self.pages.len() as u32)
    }

    fn metadata(&self) -> Result<Metadata> {
        Ok(self.metadata.clone())
    }

    fn page_text(&self, page_index: u32) -> Result<Vec<u8>> {
        Ok(self.page(ViewKind::Text, page_index)?.text.clone())
    }

    fn image_refs(&self, page_index: u32) -> Result<Vec<ImageRef>> {
        let page = self.page(ViewKind::Images, page_index)?;
        Ok((0..page.images.len() as u32)
            .map(|index| ImageRef { index, xref: 0 })
            .collect())
    }

    fn extract_image(&self, page_index: u32, image: &ImageRef) -> Result<Pixmap> {
        self.page(ViewKind::Images, page_index)?
            .images
            .get(image.index as usize)
            .cloned()
            .ok_or_else(|| {
                Error::extraction(
                    ViewKind::Images,
                    page_index,
                    format!("no image at index {}", image.index),
                )
            })
    }

    fn find_tables(&self, page_index: u32) -> Result<Vec<TableGrid>> {
        Ok(self.page(ViewKind::Tables, page_index)?.tables.clone())
    }

    fn links(&self, page_index: u32) -> Result<Vec<LinkRecord>> {
        Ok(self.page(ViewKind::Links, page_index)?.links.clone())
    }

    fn annotations(&self, page_index: u32) -> Result<Vec<Annotation>> {
        Ok(self.page(ViewKind::Annotations, page_index)?.annotations.clone())
    }
}
