//! PDF document views
//!
//! This module provides the lazily cached document view and the backends it
//! delegates to: PDFium for real documents, memory for prepared content.

mod backend;
mod bitmap;
mod link;
mod memory;
mod pdfium;
mod table;
mod types;
mod view;

pub use backend::DocumentBackend;
pub use bitmap::{Image, ImageRef, Pixmap};
pub use link::{normalize_record, Link, LinkKind, LinkRecord, LEGACY_RECT_KEY, RECT_KEY};
pub use memory::{MemoryDocument, MemoryPage};
pub use pdfium::PdfiumDocument;
pub use table::{detect_tables, CharBox, Table, TableGrid, TableSettings};
pub use types::{parse_pdf_date, Annotation, AnnotationKind, Metadata, Point, Rect, ViewKind};
pub use view::{get_or_compute, LazyDocumentView, PdfReader};
