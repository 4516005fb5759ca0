//! Reader configuration

use crate::pdf::TableSettings;
use std::path::PathBuf;

/// Configuration used when opening a document through PDFium
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Password for encrypted documents (default: none).
    ///
    /// Each distinct password is kept for the life of the opening thread.
    pub password: Option<String>,
    /// Directories searched for the PDFium shared library before falling back
    /// to the system library (default: `./`, `/opt/pdfium/lib`).
    ///
    /// Only consulted the first time a thread binds to PDFium.
    pub library_paths: Vec<PathBuf>,
    /// Table detection settings
    pub tables: TableSettings,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            password: None,
            library_paths: vec![PathBuf::from("./"), PathBuf::from("/opt/pdfium/lib")],
            tables: TableSettings::default(),
        }
    }
}

impl ReaderConfig {
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Search `path` for the PDFium library ahead of the default locations
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_paths.insert(0, path.into());
        self
    }

    pub fn with_table_settings(mut self, tables: TableSettings) -> Self {
        self.tables = tables;
        self
    }
}
