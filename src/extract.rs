//! PDF extraction entry points: one PDF → text JSON, image candidates and
//! an extraction summary under `<extracted_root>/<module>/`.
//!
//! pdfium is not async-safe, so the async entry points move the whole
//! extraction onto tokio's blocking pool.

use crate::config::PipelineConfig;
use crate::error::{PageIssue, Pdf2DatasetError};
use crate::output::{ExtractionReport, ExtractionSummary, PageRecord};
use crate::persist::write_json_atomic;
use crate::pipeline::{engine, input, render, text};
use pdfium_render::prelude::Pdfium;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Directory layout of one extracted module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLayout {
    pub name: String,
    pub dir: PathBuf,
}

impl ModuleLayout {
    pub fn new(extracted_root: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            dir: extracted_root.join(&name),
            name,
        }
    }

    pub fn text_file_name(&self) -> String {
        format!("{}_text.json", self.name)
    }

    pub fn text_file(&self) -> PathBuf {
        self.dir.join(self.text_file_name())
    }

    pub fn summary_file(&self) -> PathBuf {
        self.dir.join(format!("{}_summary.json", self.name))
    }

    pub fn images_dir(&self) -> PathBuf {
        self.dir.join("images")
    }
}

/// Extract one PDF.
///
/// # Errors
/// Returns `Err` only when the document as a whole is unusable (missing,
/// not a PDF, corrupt, wrong password) or an artifact cannot be written.
/// Image-phase failures are logged and reported in
/// [`ExtractionReport::issues`] with `total_images = 0`.
pub async fn extract_pdf(
    pdf_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ExtractionReport, Pdf2DatasetError> {
    let path = pdf_path.as_ref().to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = engine::bind_pdfium(config.pdfium_lib_path.as_deref())?;
        extract_pdf_blocking(&pdfium, &path, &config)
    })
    .await
    .map_err(|e| Pdf2DatasetError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Synchronous wrapper around [`extract_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_pdf_sync(
    pdf_path: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<ExtractionReport, Pdf2DatasetError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2DatasetError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_pdf(pdf_path, config))
}

/// Blocking implementation of [`extract_pdf`] over an already-bound pdfium.
pub fn extract_pdf_blocking(
    pdfium: &Pdfium,
    pdf_path: &Path,
    config: &PipelineConfig,
) -> Result<ExtractionReport, Pdf2DatasetError> {
    let start = Instant::now();
    let pdf_path = input::resolve_local(pdf_path)?;
    let layout = ModuleLayout::new(&config.extracted_root, input::module_name(&pdf_path)?);
    info!("Processing PDF: {}", pdf_path.display());

    let document = engine::open_document(pdfium, &pdf_path, config.password.as_deref())?;

    std::fs::create_dir_all(&layout.dir)
        .map_err(|e| Pdf2DatasetError::write_failed(&layout.dir, e))?;

    let mut issues = Vec::new();

    // ── Text ─────────────────────────────────────────────────────────────
    let records = text::extract_page_texts(&document, &mut issues);
    write_page_records(&layout.text_file(), &records)?;
    info!("Extracted text from {} pages", records.len());

    // ── Images ───────────────────────────────────────────────────────────
    let images_dir = layout.images_dir();
    let total_images = count_images(
        render::render_page_images(&document, &images_dir, config, &mut issues),
        &pdf_path,
        &mut issues,
    );
    info!("Extracted {} images", total_images);

    // ── Summary ──────────────────────────────────────────────────────────
    let summary = ExtractionSummary {
        pdf_name: layout.name.clone(),
        total_pages: records.len(),
        total_images,
        text_file: layout.text_file_name(),
        image_directory: images_dir,
    };
    write_json_atomic(&layout.summary_file(), &summary)?;

    info!(
        "Processed {} in {}ms",
        layout.name,
        start.elapsed().as_millis()
    );

    Ok(ExtractionReport {
        summary,
        module_dir: layout.dir,
        issues,
    })
}

/// Number of images the image phase left on disk. A failed phase has left
/// the image directory empty; it is logged and recorded as an issue.
fn count_images(
    rendered: Result<Vec<PathBuf>, Pdf2DatasetError>,
    pdf_path: &Path,
    issues: &mut Vec<PageIssue>,
) -> usize {
    match rendered {
        Ok(files) => files.len(),
        Err(e) => {
            warn!("Error extracting images from {}: {}", pdf_path.display(), e);
            issues.push(PageIssue::ImageExtractionFailed {
                detail: e.to_string(),
            });
            0
        }
    }
}

/// Persist page records as the module's text JSON.
pub fn write_page_records(path: &Path, records: &[PageRecord]) -> Result<(), Pdf2DatasetError> {
    write_json_atomic(path, records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let layout = ModuleLayout::new(Path::new("extracted_content"), "week1");
        assert_eq!(layout.dir, Path::new("extracted_content/week1"));
        assert_eq!(
            layout.text_file(),
            Path::new("extracted_content/week1/week1_text.json")
        );
        assert_eq!(
            layout.summary_file(),
            Path::new("extracted_content/week1/week1_summary.json")
        );
        assert_eq!(
            layout.images_dir(),
            Path::new("extracted_content/week1/images")
        );
    }

    #[test]
    fn page_records_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m_text.json");
        let records = vec![PageRecord {
            page: 2,
            text: "Second page\n".into(),
        }];
        write_page_records(&path, &records).unwrap();
        let back: Vec<PageRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn image_failure_keeps_text_and_reports_no_images() {
        let root = tempfile::tempdir().unwrap();
        let layout = ModuleLayout::new(root.path(), "lec");
        let records = vec![PageRecord {
            page: 1,
            text: "Intro".into(),
        }];
        write_page_records(&layout.text_file(), &records).unwrap();
        std::fs::create_dir_all(layout.images_dir()).unwrap();
        std::fs::write(layout.images_dir().join("page_1.png"), b"stale").unwrap();

        let mut issues = Vec::new();
        let rendered = render::replace_image_dir(&layout.images_dir(), |staging| {
            std::fs::write(staging.join("page_1.png"), b"half").unwrap();
            Err(Pdf2DatasetError::RasterisationFailed {
                page: 2,
                detail: "bitmap allocation failed".into(),
            })
        });
        let total = count_images(rendered, Path::new("lec.pdf"), &mut issues);

        assert_eq!(total, 0);
        assert!(matches!(
            issues.as_slice(),
            [PageIssue::ImageExtractionFailed { .. }]
        ));
        assert_eq!(
            std::fs::read_dir(layout.images_dir()).unwrap().count(),
            0,
            "no candidate may outlive a failed image phase"
        );
        let kept: Vec<PageRecord> =
            serde_json::from_str(&std::fs::read_to_string(layout.text_file()).unwrap()).unwrap();
        assert_eq!(kept, records);
    }
}
