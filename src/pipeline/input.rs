//! Input resolution: validate a PDF path and derive its module name.
//!
//! We validate the PDF magic bytes (`%PDF`) before handing the file to pdfium
//! so callers get a meaningful error rather than an opaque pdfium failure.

use crate::error::Pdf2DatasetError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Validate that `path` exists, is readable, and starts with `%PDF`.
pub fn resolve_local(path: &Path) -> Result<PathBuf, Pdf2DatasetError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(Pdf2DatasetError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2DatasetError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2DatasetError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2DatasetError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Module name for a PDF: its file name with the extension stripped.
pub fn module_name(pdf_path: &Path) -> Result<String, Pdf2DatasetError> {
    pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Pdf2DatasetError::Internal(format!(
                "cannot derive a module name from '{}'",
                pdf_path.display()
            ))
        })
}

/// Collect the PDFs named by `input`: the file itself, or every `*.pdf`
/// directly inside a directory, sorted by file name.
pub fn collect_pdfs(input: &Path) -> Result<Vec<PathBuf>, Pdf2DatasetError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(Pdf2DatasetError::FileNotFound {
            path: input.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(input).map_err(|e| {
        Pdf2DatasetError::Internal(format!("cannot list '{}': {}", input.display(), e))
    })?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", input.display(), e);
                continue;
            }
        };
        let path = entry.path();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}
