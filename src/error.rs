//! Error types for pdf-lazy-view

use crate::pdf::ViewKind;
use thiserror::Error;

/// Result type alias for pdf-lazy-view
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pdf-lazy-view
#[derive(Error, Debug)]
pub enum Error {
    /// PDF file not found
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// The file exists but could not be opened as a PDF document
    #[error("Failed to open document {path}: {reason}")]
    DocumentOpen { path: String, reason: String },

    /// PDF is password protected and no (or a wrong) password was provided
    #[error("PDF is password protected")]
    PasswordRequired,

    /// PDFium library could not be bound
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// Failure while computing one of the document views
    #[error(
        "Failed to extract {view}{}: {reason}",
        .page.map(|p| format!(" from page {}", p)).unwrap_or_default()
    )]
    Extraction {
        view: ViewKind,
        /// Page number (1-indexed), when the failure is tied to a page
        page: Option<u32>,
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error was raised while opening the document, as opposed to
    /// while computing a view of an already opened one.
    pub fn is_open_error(&self) -> bool {
        matches!(
            self,
            Error::PdfNotFound { .. }
                | Error::DocumentOpen { .. }
                | Error::PasswordRequired
                | Error::Pdfium { .. }
        )
    }

    /// Shorthand for an extraction failure on a specific page (0-indexed input).
    pub(crate) fn extraction(view: ViewKind, page_index: u32, reason: impl ToString) -> Self {
        Error::Extraction {
            view,
            page: Some(page_index + 1),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_errors_are_grouped() {
        assert!(Error::PdfNotFound {
            path: "missing.pdf".to_string()
        }
        .is_open_error());
        assert!(Error::PasswordRequired.is_open_error());
        assert!(!Error::extraction(ViewKind::Text, 0, "bad stream").is_open_error());
    }

    #[test]
    fn test_extraction_message_uses_one_indexed_page() {
        let err = Error::extraction(ViewKind::Images, 2, "corrupt image");
        assert_eq!(
            err.to_string(),
            "Failed to extract images from page 3: corrupt image"
        );

        let err = Error::Extraction {
            view: ViewKind::Metadata,
            page: None,
            reason: "no info dictionary".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to extract metadata: no info dictionary"
        );
    }
}
