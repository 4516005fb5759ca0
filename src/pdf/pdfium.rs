//! PDFium-backed document

use super::backend::DocumentBackend;
use super::bitmap::{ImageRef, Pixmap};
use super::link::{LinkKind, LinkRecord, LEGACY_RECT_KEY};
use super::table::{detect_tables, CharBox, TableGrid, TableSettings};
use super::types::{Annotation, AnnotationKind, Metadata, Rect, ViewKind};
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use pdfium_render::prelude::*;
use serde_json::{json, Value};
use std::cell::{OnceCell, RefCell};
use std::collections::HashSet;
use std::ffi::c_void;
use std::io::Read;
use std::path::{Path, PathBuf};

thread_local! {
    // PDFium documents borrow their binding, so a thread keeps one binding
    // for its whole life and documents can be owned by value.
    static PDFIUM: OnceCell<&'static Pdfium> = const { OnceCell::new() };

    // Passwords live as long as the documents opened with them
    static PASSWORDS: RefCell<HashSet<&'static str>> = RefCell::new(HashSet::new());
}

/// A `'static` copy of `password`, allocated once per distinct password
/// per thread
fn intern_password(password: &str) -> &'static str {
    PASSWORDS.with(|passwords| {
        let mut passwords = passwords.borrow_mut();
        if let Some(interned) = passwords.get(password) {
            return *interned;
        }
        let interned: &'static str = Box::leak(password.to_owned().into_boxed_str());
        passwords.insert(interned);
        interned
    })
}

/// Get this thread's PDFium binding, binding on first use
fn thread_pdfium(library_paths: &[PathBuf]) -> Result<&'static Pdfium> {
    PDFIUM.with(|cell| {
        if let Some(pdfium) = cell.get() {
            return Ok(*pdfium);
        }
        let pdfium: &'static Pdfium = Box::leak(Box::new(create_pdfium(library_paths)?));
        let _ = cell.set(pdfium);
        Ok(pdfium)
    })
}

fn create_pdfium(library_paths: &[PathBuf]) -> Result<Pdfium> {
    let mut last_error = None;
    for dir in library_paths {
        match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)) {
            Ok(bindings) => return Ok(Pdfium::new(bindings)),
            Err(e) => last_error = Some(e),
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| Error::Pdfium {
        reason: format!(
            "Failed to initialize PDFium: {} (searched {} directories, last error: {})",
            e,
            library_paths.len(),
            last_error.map(|e| e.to_string()).unwrap_or_default()
        ),
    })?;
    Ok(Pdfium::new(bindings))
}

/// Check the `%PDF` header without handing the file to PDFium
fn check_pdf_header(path: &Path) -> Result<()> {
    let open_error = |reason: String| Error::DocumentOpen {
        path: path.display().to_string(),
        reason,
    };

    let mut header = [0u8; 4];
    std::fs::File::open(path)
        .and_then(|mut file| file.read_exact(&mut header))
        .map_err(|e| open_error(e.to_string()))?;

    if &header != b"%PDF" {
        return Err(open_error("Not a valid PDF file".to_string()));
    }
    Ok(())
}

/// Document opened through PDFium
pub struct PdfiumDocument {
    document: PdfDocument<'static>,
    tables: TableSettings,
}

impl PdfiumDocument {
    /// Open a PDF from a file path
    pub fn open<P: AsRef<Path>>(path: P, config: &ReaderConfig) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(Error::PdfNotFound {
                path: path.display().to_string(),
            });
        }
        check_pdf_header(path)?;

        let pdfium = thread_pdfium(&config.library_paths)?;

        // pdfium-render ties the password borrow to the document lifetime
        let password = config.password.as_deref().map(intern_password);

        let document = pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| match e {
                PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
                    Error::PasswordRequired
                }
                _ => Error::DocumentOpen {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                },
            })?;

        tracing::debug!(
            path = %path.display(),
            pages = document.pages().len(),
            "opened document"
        );

        Ok(Self {
            document,
            tables: config.tables.clone(),
        })
    }

    fn page(&self, view: ViewKind, page_index: u32) -> Result<PdfPage<'static>> {
        let index = u16::try_from(page_index)
            .map_err(|_| Error::extraction(view, page_index, "page index out of range"))?;
        self.document
            .pages()
            .get(index)
            .map_err(|e| Error::extraction(view, page_index, e))
    }

    /// `/Trapped` from the information dictionary, which has no metadata tag type
    fn trapped(&self) -> Option<String> {
        let bindings = self.document.bindings();
        let handle = bindings.get_handle_from_document(&self.document);

        let len = bindings.FPDF_GetMetaText(handle, "Trapped", std::ptr::null_mut(), 0);
        // a missing entry is just the UTF-16 terminator
        if len <= 2 {
            return None;
        }
        let mut buffer = vec![0u8; len as usize];
        bindings.FPDF_GetMetaText(handle, "Trapped", buffer.as_mut_ptr() as *mut c_void, len);
        decode_utf16le(&buffer)
    }

    fn encryption(&self) -> Option<String> {
        match self.document.permissions().security_handler_revision() {
            Ok(PdfSecurityHandlerRevision::Unprotected) | Err(_) => None,
            Ok(revision) => Some(format!("Standard {:?}", revision)),
        }
    }
}

impl DocumentBackend for PdfiumDocument {
    fn page_count(&self) -> Result<u32> {
        Ok(self.document.pages().len() as u32)
    }

    fn metadata(&self) -> Result<Metadata> {
        let meta = self.document.metadata();
        let tag = |tag: PdfDocumentMetadataTagType| meta.get(tag).map(|t| t.value().to_string());

        Ok(Metadata {
            producer: tag(PdfDocumentMetadataTagType::Producer),
            format: format_version(self.document.version()),
            encryption: self.encryption(),
            author: tag(PdfDocumentMetadataTagType::Author),
            modification_date: tag(PdfDocumentMetadataTagType::ModificationDate),
            keywords: tag(PdfDocumentMetadataTagType::Keywords),
            title: tag(PdfDocumentMetadataTagType::Title),
            creation_date: tag(PdfDocumentMetadataTagType::CreationDate),
            creator: tag(PdfDocumentMetadataTagType::Creator),
            subject: tag(PdfDocumentMetadataTagType::Subject),
            trapped: self.trapped(),
        })
    }

    fn page_text(&self, page_index: u32) -> Result<Vec<u8>> {
        let page = self.page(ViewKind::Text, page_index)?;
        let text = page
            .text()
            .map_err(|e| Error::extraction(ViewKind::Text, page_index, e))?;
        Ok(text.all().into_bytes())
    }

    fn image_refs(&self, page_index: u32) -> Result<Vec<ImageRef>> {
        let page = self.page(ViewKind::Images, page_index)?;
        Ok(page
            .objects()
            .iter()
            .enumerate()
            .filter(|(_, object)| object.as_image_object().is_some())
            .map(|(index, _)| ImageRef {
                index: index as u32,
                xref: 0,
            })
            .collect())
    }

    fn extract_image(&self, page_index: u32, image: &ImageRef) -> Result<Pixmap> {
        let page = self.page(ViewKind::Images, page_index)?;
        let object = page
            .objects()
            .get(image.index as usize)
            .map_err(|e| Error::extraction(ViewKind::Images, page_index, e))?;
        let image_object = object.as_image_object().ok_or_else(|| {
            Error::extraction(
                ViewKind::Images,
                page_index,
                format!("object {} is not an image", image.index),
            )
        })?;

        let raw = image_object
            .get_raw_image()
            .map_err(|e| Error::extraction(ViewKind::Images, page_index, e))?;
        Ok(Pixmap::from(&raw))
    }

    fn find_tables(&self, page_index: u32) -> Result<Vec<TableGrid>> {
        let page = self.page(ViewKind::Tables, page_index)?;
        let text = page
            .text()
            .map_err(|e| Error::extraction(ViewKind::Tables, page_index, e))?;
        Ok(detect_tables(collect_chars(&text), &self.tables))
    }

    fn links(&self, page_index: u32) -> Result<Vec<LinkRecord>> {
        let page = self.page(ViewKind::Links, page_index)?;

        // Link objects don't expose their bounds; link annotations do, in the
        // same order
        let mut bounds = page
            .annotations()
            .iter()
            .filter(|annotation| annotation.annotation_type() == PdfPageAnnotationType::Link)
            .map(|annotation| annotation.bounds().ok().map(rect_from_pdfium))
            .collect::<Vec<_>>()
            .into_iter();

        let mut records = Vec::new();
        for link in page.links().iter() {
            let (kind, uri) = match link.action() {
                Some(action) => match action.action_type() {
                    PdfActionType::Uri => (
                        LinkKind::Uri,
                        action.as_uri_action().and_then(|a| a.uri().ok()),
                    ),
                    PdfActionType::GoToDestinationInSameDocument => (LinkKind::Goto, None),
                    PdfActionType::GoToDestinationInRemoteDocument
                    | PdfActionType::GoToDestinationInEmbeddedDocument => (LinkKind::GotoR, None),
                    PdfActionType::Launch => (LinkKind::Launch, None),
                    _ => (LinkKind::None, None),
                },
                None => (LinkKind::None, None),
            };

            let destination = link.destination();
            let dest_page = destination
                .as_ref()
                .and_then(|dest| dest.page_index().ok())
                .map(|idx| idx as u32 + 1);
            let kind = if kind == LinkKind::None && dest_page.is_some() {
                LinkKind::Goto
            } else {
                kind
            };

            let mut record = LinkRecord::new();
            record.insert("kind".to_string(), serde_json::to_value(kind)?);
            if let Some(uri) = uri {
                record.insert("uri".to_string(), Value::String(uri));
            }
            if let Some(page) = dest_page {
                record.insert("page".to_string(), Value::from(page));
            }
            if let Some(Ok(PdfDestinationViewSettings::SpecificCoordinatesAndZoom(x, y, zoom))) =
                destination.as_ref().map(|dest| dest.view_settings())
            {
                insert_destination_view(&mut record, x.map(|p| p.value), y.map(|p| p.value), zoom);
            }
            if let Some(Some(rect)) = bounds.next() {
                record.insert(LEGACY_RECT_KEY.to_string(), serde_json::to_value(rect)?);
            }
            records.push(record);
        }

        Ok(records)
    }

    fn annotations(&self, page_index: u32) -> Result<Vec<Annotation>> {
        let page = self.page(ViewKind::Annotations, page_index)?;
        let page_text = page.text().ok();

        let mut annotations = Vec::new();
        for annotation in page.annotations().iter() {
            let kind = annotation_kind(annotation.annotation_type());

            // Popups belong to their parent annotation
            if kind == AnnotationKind::Popup {
                continue;
            }

            let highlighted_text = if kind.is_text_markup() {
                text_for_annotation(&page_text, &annotation)
            } else {
                None
            };

            annotations.push(Annotation {
                page: page_index + 1,
                kind,
                contents: annotation.contents().filter(|s| !s.is_empty()),
                author: annotation.creator().filter(|s| !s.is_empty()),
                created: annotation.creation_date().map(|dt| dt.to_string()),
                modified: annotation.modification_date().map(|dt| dt.to_string()),
                rect: annotation.bounds().ok().map(rect_from_pdfium),
                color: annotation.fill_color().ok().map(|c| color_to_hex(&c)),
                highlighted_text,
            });
        }

        Ok(annotations)
    }
}

fn format_version(version: PdfDocumentVersion) -> Option<String> {
    let (major, minor) = match version {
        PdfDocumentVersion::Pdf1_0 => (1, 0),
        PdfDocumentVersion::Pdf1_1 => (1, 1),
        PdfDocumentVersion::Pdf1_2 => (1, 2),
        PdfDocumentVersion::Pdf1_3 => (1, 3),
        PdfDocumentVersion::Pdf1_4 => (1, 4),
        PdfDocumentVersion::Pdf1_5 => (1, 5),
        PdfDocumentVersion::Pdf1_6 => (1, 6),
        PdfDocumentVersion::Pdf1_7 => (1, 7),
        PdfDocumentVersion::Pdf2_0 => (2, 0),
        PdfDocumentVersion::Other(v) => (v / 10, v % 10),
        PdfDocumentVersion::Unset => return None,
    };
    Some(format!("PDF {}.{}", major, minor))
}

/// Decode a NUL-terminated UTF-16LE buffer as PDFium fills it
fn decode_utf16le(bytes: &[u8]) -> Option<String> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    let text = String::from_utf16_lossy(&units);
    (!text.is_empty()).then_some(text)
}

/// Store an explicit `/XYZ` destination's target point and zoom
fn insert_destination_view(
    record: &mut LinkRecord,
    x: Option<f32>,
    y: Option<f32>,
    zoom: Option<f32>,
) {
    if x.is_some() || y.is_some() {
        record.insert(
            "to".to_string(),
            json!([x.unwrap_or_default(), y.unwrap_or_default()]),
        );
    }
    if let Some(zoom) = zoom {
        record.insert("zoom".to_string(), Value::from(zoom));
    }
}

fn rect_from_pdfium(rect: PdfRect) -> Rect {
    Rect::new(
        rect.left().value,
        rect.top().value,
        rect.right().value,
        rect.bottom().value,
    )
}

fn color_to_hex(color: &PdfColor) -> String {
    format!(
        "#{:02X}{:02X}{:02X}",
        color.red(),
        color.green(),
        color.blue()
    )
}

/// Positioned characters of a page's text layer
fn collect_chars(text: &PdfPageText) -> Vec<CharBox> {
    let mut chars = Vec::new();

    for segment in text.segments().iter() {
        if let Ok(segment_chars) = segment.chars() {
            for char_result in segment_chars.iter() {
                let bounds = char_result.loose_bounds();
                if let (Some(c), Ok(bounds)) = (char_result.unicode_char(), bounds) {
                    chars.push(CharBox {
                        char: c,
                        x: bounds.left().value,
                        y: bounds.top().value,
                        width: bounds.width().value,
                        height: bounds.height().value,
                    });
                }
            }
        }
    }

    chars
}

/// Text under a markup annotation, by PDFium's association first and the
/// annotation bounds second
fn text_for_annotation(
    page_text: &Option<PdfPageText>,
    annotation: &PdfPageAnnotation,
) -> Option<String> {
    let page_text = page_text.as_ref()?;

    if let Ok(text) = page_text.for_annotation(annotation) {
        let text = text.trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }

    let bounds = annotation.bounds().ok()?;
    let text = page_text.inside_rect(bounds);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn annotation_kind(ann_type: PdfPageAnnotationType) -> AnnotationKind {
    match ann_type {
        PdfPageAnnotationType::Text => AnnotationKind::Text,
        PdfPageAnnotationType::Link => AnnotationKind::Link,
        PdfPageAnnotationType::FreeText => AnnotationKind::FreeText,
        PdfPageAnnotationType::Line => AnnotationKind::Line,
        PdfPageAnnotationType::Square => AnnotationKind::Square,
        PdfPageAnnotationType::Circle => AnnotationKind::Circle,
        PdfPageAnnotationType::Polygon => AnnotationKind::Polygon,
        PdfPageAnnotationType::Polyline => AnnotationKind::Polyline,
        PdfPageAnnotationType::Highlight => AnnotationKind::Highlight,
        PdfPageAnnotationType::Underline => AnnotationKind::Underline,
        PdfPageAnnotationType::Squiggly => AnnotationKind::Squiggly,
        PdfPageAnnotationType::Strikeout => AnnotationKind::Strikeout,
        PdfPageAnnotationType::Stamp => AnnotationKind::Stamp,
        PdfPageAnnotationType::Caret => AnnotationKind::Caret,
        PdfPageAnnotationType::Ink => AnnotationKind::Ink,
        PdfPageAnnotationType::Popup => AnnotationKind::Popup,
        PdfPageAnnotationType::FileAttachment => AnnotationKind::FileAttachment,
        PdfPageAnnotationType::Sound => AnnotationKind::Sound,
        PdfPageAnnotationType::Movie => AnnotationKind::Movie,
        PdfPageAnnotationType::Widget => AnnotationKind::Widget,
        PdfPageAnnotationType::Screen => AnnotationKind::Screen,
        PdfPageAnnotationType::PrinterMark => AnnotationKind::PrinterMark,
        PdfPageAnnotationType::TrapNet => AnnotationKind::TrapNet,
        PdfPageAnnotationType::Watermark => AnnotationKind::Watermark,
        PdfPageAnnotationType::ThreeD => AnnotationKind::ThreeD,
        PdfPageAnnotationType::RichMedia => AnnotationKind::RichMedia,
        PdfPageAnnotationType::XfaWidget => AnnotationKind::XfaWidget,
        PdfPageAnnotationType::Redacted => AnnotationKind::Redacted,
        PdfPageAnnotationType::Unknown => AnnotationKind::Unknown,
    }
}
