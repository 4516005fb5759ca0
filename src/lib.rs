//! Lazy PDF document views
//!
//! This crate wraps a PDF document and exposes six derived views, each
//! computed on first access and cached for the lifetime of the view:
//! - `metadata`: Document information dictionary fields
//! - `text`: Text of all pages, concatenated in page order
//! - `images`: Embedded images decoded to bitmaps
//! - `tables`: Detected tables as labeled rows and columns
//! - `links`: Link records with a normalized source rectangle
//! - `annotations`: Page annotations in page order

pub mod config;
pub mod error;
pub mod pdf;

pub use config::ReaderConfig;
pub use error::{Error, Result};
pub use pdf::{
    Annotation, AnnotationKind, DocumentBackend, Image, LazyDocumentView, Link, LinkKind,
    MemoryDocument, MemoryPage, Metadata, PdfReader, PdfiumDocument, Pixmap, Point, Rect, Table,
    TableSettings, ViewKind,
};
