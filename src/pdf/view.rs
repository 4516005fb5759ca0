//! Lazily computed, cached document views

use super::backend::DocumentBackend;
use super::bitmap::Image;
use super::link::Link;
use super::pdfium::PdfiumDocument;
use super::table::Table;
use super::types::{Annotation, Metadata, ViewKind};
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use std::path::Path;

/// Return the value in `slot`, computing and storing it first if the slot is
/// empty. A failed computation leaves the slot empty.
pub fn get_or_compute<T, F>(slot: &mut Option<T>, compute: F) -> Result<&T>
where
    F: FnOnce() -> Result<T>,
{
    let value = match slot.take() {
        Some(value) => value,
        None => compute()?,
    };
    Ok(slot.insert(value))
}

/// Document view that computes each derived view on first access and keeps
/// it for its own lifetime.
///
/// Accessors take `&mut self`: a view has a single owner and is never
/// shared between threads, so no two computations of a view can race.
pub struct LazyDocumentView<B: DocumentBackend = PdfiumDocument> {
    backend: B,
    metadata: Option<Metadata>,
    text: Option<String>,
    images: Option<Vec<Image>>,
    tables: Option<Vec<Table>>,
    links: Option<Vec<Link>>,
    annotations: Option<Vec<Annotation>>,
}

/// View over a PDFium document
pub type PdfReader = LazyDocumentView<PdfiumDocument>;

impl LazyDocumentView<PdfiumDocument> {
    /// Open the PDF at `path` with the default configuration
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(path, &ReaderConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<Self> {
        let backend = PdfiumDocument::open(path, config)?;
        Ok(Self::from_backend(backend))
    }
}

impl<B: DocumentBackend> LazyDocumentView<B> {
    /// Wrap an already opened backend
    pub fn from_backend(backend: B) -> Self {
        Self {
            backend,
            metadata: None,
            text: None,
            images: None,
            tables: None,
            links: None,
            annotations: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn page_count(&self) -> Result<u32> {
        self.backend.page_count()
    }

    /// Whether `view` has already been computed and cached
    pub fn is_computed(&self, view: ViewKind) -> bool {
        match view {
            ViewKind::Metadata => self.metadata.is_some(),
            ViewKind::Text => self.text.is_some(),
            ViewKind::Images => self.images.is_some(),
            ViewKind::Tables => self.tables.is_some(),
            ViewKind::Links => self.links.is_some(),
            ViewKind::Annotations => self.annotations.is_some(),
        }
    }

    pub fn metadata(&mut self) -> Result<&Metadata> {
        let backend = &self.backend;
        memoize(ViewKind::Metadata, &mut self.metadata, || backend.metadata())
    }

    /// Text of all pages in page order, with no separator between pages
    pub fn text(&mut self) -> Result<&str> {
        let backend = &self.backend;
        memoize(ViewKind::Text, &mut self.text, || compute_text(backend)).map(String::as_str)
    }

    /// Images of all pages, in page order then discovery order
    pub fn images(&mut self) -> Result<&[Image]> {
        let backend = &self.backend;
        memoize(ViewKind::Images, &mut self.images, || compute_images(backend)).map(Vec::as_slice)
    }

    /// Tables of all pages, in page order then detection order
    pub fn tables(&mut self) -> Result<&[Table]> {
        let backend = &self.backend;
        memoize(ViewKind::Tables, &mut self.tables, || compute_tables(backend)).map(Vec::as_slice)
    }

    pub fn links(&mut self) -> Result<&[Link]> {
        let backend = &self.backend;
        memoize(ViewKind::Links, &mut self.links, || compute_links(backend)).map(Vec::as_slice)
    }

    pub fn annotations(&mut self) -> Result<&[Annotation]> {
        let backend = &self.backend;
        memoize(ViewKind::Annotations, &mut self.annotations, || {
            compute_annotations(backend)
        })
        .map(Vec::as_slice)
    }
}

/// Number of items a view holds, for logging
trait ViewSize {
    fn view_size(&self) -> usize;
}

impl ViewSize for Metadata {
    fn view_size(&self) -> usize {
        1
    }
}

impl ViewSize for String {
    fn view_size(&self) -> usize {
        self.len()
    }
}

impl<T> ViewSize for Vec<T> {
    fn view_size(&self) -> usize {
        self.len()
    }
}

fn memoize<'a, T, F>(view: ViewKind, slot: &'a mut Option<T>, compute: F) -> Result<&'a T>
where
    T: ViewSize,
    F: FnOnce() -> Result<T>,
{
    if slot.is_some() {
        tracing::trace!(view = %view, "view cache hit");
    }

    get_or_compute(slot, || {
        tracing::debug!(view = %view, "computing view");
        match compute() {
            Ok(value) => {
                tracing::debug!(view = %view, size = value.view_size(), "view computed");
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(view = %view, error = %e, "view computation failed");
                Err(e)
            }
        }
    })
}

fn compute_text<B: DocumentBackend>(backend: &B) -> Result<String> {
    let mut bytes = Vec::new();
    for page_index in 0..backend.page_count()? {
        bytes.extend(backend.page_text(page_index)?);
    }

    // Valid UTF-8 passes through unchanged; malformed sequences become U+FFFD
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

fn compute_images<B: DocumentBackend>(backend: &B) -> Result<Vec<Image>> {
    let mut images = Vec::new();
    for page_index in 0..backend.page_count()? {
        for (index, image_ref) in backend.image_refs(page_index)?.iter().enumerate() {
            let pixmap = backend.extract_image(page_index, image_ref)?;
            let image = pixmap
                .into_image()
                .map_err(|reason| Error::extraction(ViewKind::Images, page_index, reason))?;

            images.push(Image {
                page: page_index + 1,
                index: index as u32,
                xref: image_ref.xref,
                image,
            });
        }
    }
    Ok(images)
}

fn compute_tables<B: DocumentBackend>(backend: &B) -> Result<Vec<Table>> {
    let mut tables = Vec::new();
    for page_index in 0..backend.page_count()? {
        for (index, grid) in backend.find_tables(page_index)?.into_iter().enumerate() {
            tables.push(Table::from_grid(page_index + 1, index as u32, grid));
        }
    }
    Ok(tables)
}

fn compute_links<B: DocumentBackend>(backend: &B) -> Result<Vec<Link>> {
    let mut links = Vec::new();
    for page_index in 0..backend.page_count()? {
        for record in backend.links(page_index)? {
            let mut link = Link::from_record(record)
                .map_err(|e| Error::extraction(ViewKind::Links, page_index, e))?;
            link.source_page = page_index + 1;
            links.push(link);
        }
    }
    Ok(links)
}

fn compute_annotations<B: DocumentBackend>(backend: &B) -> Result<Vec<Annotation>> {
    let mut annotations = Vec::new();
    for page_index in 0..backend.page_count()? {
        annotations.extend(backend.annotations(page_index)?);
    }
    Ok(annotations)
}
