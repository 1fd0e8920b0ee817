//! Error types for the pdf2dataset library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2DatasetError`] — **Fatal** for one document or one module: the PDF
//!   cannot be opened, the module's text JSON is missing, an output file
//!   cannot be written. The batch driver logs it and moves on to the next
//!   document/module.
//!
//! * [`PageIssue`] — **Non-fatal**: a single page has no image, or the image
//!   phase of one PDF failed. Recorded in the returned summary/manifest and
//!   logged; the surrounding work carries on.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2dataset library.
///
/// Per-page problems use [`PageIssue`] and never abort a document.
#[derive(Debug, Error)]
pub enum Pdf2DatasetError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error while rendering or saving a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: u32, detail: String },

    // ── Module errors ─────────────────────────────────────────────────────
    /// The module's `<module>_text.json` does not exist.
    #[error("Text file for module '{module}' not found: '{path}'\nRun `pdf2dataset extract` first.")]
    TextFileMissing { module: String, path: PathBuf },

    /// The module's text JSON exists but does not parse as page records.
    #[error("Text file '{path}' is not a valid page-record array: {detail}")]
    InvalidTextFile { path: PathBuf, detail: String },

    /// The module's summary JSON exists but does not parse.
    #[error("Summary file '{path}' is invalid: {detail}")]
    SummaryInvalid { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file or directory.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not copy a page image into the pool.
    #[error("Failed to copy '{from}' to '{to}': {source}")]
    ImageCopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Chat errors ───────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The chat model returned an error.
    #[error("Chat request failed: {0}")]
    ChatFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory).\n\
  • Place libpdfium next to the binary or in the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2DatasetError {
    /// Wrap an I/O failure on `path` as [`Pdf2DatasetError::OutputWriteFailed`].
    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputWriteFailed {
            path: path.into(),
            source,
        }
    }
}

/// A recoverable problem with one page (or with one PDF's image phase).
///
/// Collected in [`crate::output::ExtractionReport::issues`]; missing images
/// also surface as [`crate::output::ModuleManifest::skipped_pages`].
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageIssue {
    /// Text exists for the page but no candidate image resolved.
    #[error("Page {page}: no image found")]
    MissingImage { page: u32 },

    /// The page's text layer could not be read; the page is treated as blank.
    #[error("Page {page}: text unreadable: {detail}")]
    TextUnreadable { page: u32, detail: String },

    /// Image extraction for the whole document failed.
    #[error("Image extraction failed: {detail}")]
    ImageExtractionFailed { detail: String },

    /// One embedded image could not be decoded or written.
    #[error("Page {page}: embedded image {index} skipped: {detail}")]
    EmbeddedImageFailed {
        page: u32,
        index: usize,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_names_page() {
        let issue = PageIssue::MissingImage { page: 7 };
        assert_eq!(issue.to_string(), "Page 7: no image found");
    }

    #[test]
    fn text_file_missing_display() {
        let e = Pdf2DatasetError::TextFileMissing {
            module: "week1".into(),
            path: PathBuf::from("extracted_content/week1/week1_text.json"),
        };
        let msg = e.to_string();
        assert!(msg.contains("week1"), "got: {msg}");
        assert!(msg.contains("week1_text.json"), "got: {msg}");
    }

    #[test]
    fn write_failed_keeps_source() {
        use std::error::Error as _;
        let e = Pdf2DatasetError::write_failed(
            "out/a.json",
            std::io::Error::other("disk full"),
        );
        assert!(e.to_string().contains("out/a.json"));
        assert!(e.source().is_some());
    }

    #[test]
    fn embedded_image_failed_display() {
        let issue = PageIssue::EmbeddedImageFailed {
            page: 2,
            index: 3,
            detail: "bad stream".into(),
        };
        let msg = issue.to_string();
        assert!(msg.contains("Page 2"));
        assert!(msg.contains("embedded image 3"));
    }
}
