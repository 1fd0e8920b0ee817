//! pdfium binding and document loading.
//!
//! pdfium is a C++ library loaded at runtime. We look for it, in order, at
//! the configured path (`PDFIUM_LIB_PATH` in the CLI), in the working
//! directory, and finally on the system library path.

use crate::error::Pdf2DatasetError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Bind to a pdfium shared library.
///
/// `lib_path` may name the library file itself or the directory holding it.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, Pdf2DatasetError> {
    let mut attempts: Vec<String> = Vec::new();

    if let Some(path) = lib_path {
        let candidate = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(path)
        } else {
            path.to_path_buf()
        };
        match Pdfium::bind_to_library(&candidate) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", candidate.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => attempts.push(format!("{}: {}", candidate.display(), e)),
        }
    }

    let local = Pdfium::pdfium_platform_library_name_at_path("./");
    let bindings = Pdfium::bind_to_library(&local)
        .or_else(|e| {
            attempts.push(format!("{}: {}", local.display(), e));
            Pdfium::bind_to_system_library()
        })
        .map_err(|e| {
            attempts.push(format!("system library: {}", e));
            Pdf2DatasetError::PdfiumBindingFailed(attempts.join("; "))
        })?;

    Ok(Pdfium::new(bindings))
}

/// Open a PDF, mapping pdfium's load errors onto [`Pdf2DatasetError`].
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2DatasetError> {
    pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| match e {
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
                if password.is_some() {
                    Pdf2DatasetError::WrongPassword {
                        path: pdf_path.to_path_buf(),
                    }
                } else {
                    Pdf2DatasetError::PasswordRequired {
                        path: pdf_path.to_path_buf(),
                    }
                }
            }
            other => Pdf2DatasetError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", other),
            },
        })
}
