//! Dataset builders: join a module's page records with resolved page images
//! and emit one conversation record per page.
//!
//! The join is shared; what differs per target schema lives behind
//! [`RecordFormat`]:
//!
//! * [`llava::LlavaFormat`] references the extracted image in place.
//! * [`qwen::QwenFormat`] copies it into a shared pool first.
//!
//! ```text
//! <module>_text.json ──▶ trim / drop blank ──▶ resolve image ──▶ place image ──▶ record
//!                                                  │ none
//!                                                  └──▶ warn + skipped_pages
//! ```

pub mod llava;
pub mod qwen;

use crate::config::{DatasetFormat, PipelineConfig};
use crate::error::{PageIssue, Pdf2DatasetError};
use crate::extract::ModuleLayout;
use crate::output::{ExtractionSummary, ModuleManifest, PageRecord};
use crate::persist::{read_json, write_json_atomic};
use crate::pipeline::resolve::resolve_page_image;
use crate::progress::ProgressCallback;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use llava::LlavaFormat;
pub use qwen::{pool_image_name, QwenFormat};

/// Where one module's extracted text and images live.
///
/// Passed explicitly to the builders; nothing here scans the filesystem
/// beyond the module's own directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    pub name: String,
    pub text_file: PathBuf,
    pub image_dir: PathBuf,
}

impl ModuleDescriptor {
    pub fn new(
        name: impl Into<String>,
        text_file: impl Into<PathBuf>,
        image_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            text_file: text_file.into(),
            image_dir: image_dir.into(),
        }
    }

    /// Describe the module stored in `dir`, named after the directory.
    ///
    /// The module's `<name>_summary.json` decides where text and images
    /// live. Without a summary the standard layout is assumed.
    pub fn from_dir(dir: &Path) -> Result<Self, Pdf2DatasetError> {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Pdf2DatasetError::Internal(format!("'{}' has no module name", dir.display()))
            })?;
        let layout = ModuleLayout {
            name: name.clone(),
            dir: dir.to_path_buf(),
        };
        let summary_path = layout.summary_file();

        let summary: Option<ExtractionSummary> = match read_json(&summary_path) {
            Ok(Some(Ok(summary))) => Some(summary),
            Ok(Some(Err(detail))) => {
                return Err(Pdf2DatasetError::SummaryInvalid {
                    path: summary_path,
                    detail,
                })
            }
            Ok(None) => {
                debug!("{}: no summary, assuming standard layout", name);
                None
            }
            Err(e) => {
                return Err(Pdf2DatasetError::SummaryInvalid {
                    path: summary_path,
                    detail: e.to_string(),
                })
            }
        };

        Ok(match summary {
            Some(s) => {
                let image_dir = if s.image_directory.is_absolute() || s.image_directory.is_dir() {
                    s.image_directory
                } else {
                    layout.images_dir()
                };
                Self::new(name, dir.join(&s.text_file), image_dir)
            }
            None => Self::new(name, layout.text_file(), layout.images_dir()),
        })
    }

    /// Load the module's page records.
    ///
    /// # Errors
    /// [`Pdf2DatasetError::TextFileMissing`] when the text JSON is absent,
    /// [`Pdf2DatasetError::InvalidTextFile`] when it does not parse.
    pub fn load_pages(&self) -> Result<Vec<PageRecord>, Pdf2DatasetError> {
        match read_json::<Vec<PageRecord>>(&self.text_file) {
            Ok(Some(Ok(pages))) => Ok(pages),
            Ok(Some(Err(detail))) => Err(Pdf2DatasetError::InvalidTextFile {
                path: self.text_file.clone(),
                detail,
            }),
            Ok(None) => Err(Pdf2DatasetError::TextFileMissing {
                module: self.name.clone(),
                path: self.text_file.clone(),
            }),
            Err(e) => Err(Pdf2DatasetError::InvalidTextFile {
                path: self.text_file.clone(),
                detail: e.to_string(),
            }),
        }
    }
}

/// Target-schema specific half of a dataset build.
pub trait RecordFormat {
    /// Serialised record type.
    type Record: Serialize;

    fn format(&self) -> DatasetFormat;

    /// Path the record should reference for `page`'s resolved image.
    /// Implementations may copy the file; the returned path must exist.
    fn place_image(
        &self,
        module: &str,
        page: u32,
        resolved: &Path,
    ) -> Result<PathBuf, Pdf2DatasetError>;

    /// Build one record from a placed image and the page's trimmed text.
    fn make_record(&self, image: &Path, text: &str) -> Self::Record;
}

/// Records produced for one module, before they are written.
#[derive(Debug)]
pub struct JoinedRecords<R> {
    pub records: Vec<R>,
    pub images: Vec<PathBuf>,
    pub skipped_pages: Vec<u32>,
}

/// Join page records with resolved images.
///
/// Blank pages are dropped silently; pages with text but no image are
/// logged, reported to `progress`, and listed in `skipped_pages`.
pub fn join_records<F: RecordFormat>(
    module: &ModuleDescriptor,
    pages: &[PageRecord],
    format: &F,
    progress: Option<&ProgressCallback>,
) -> Result<JoinedRecords<F::Record>, Pdf2DatasetError> {
    let mut joined = JoinedRecords {
        records: Vec::with_capacity(pages.len()),
        images: Vec::with_capacity(pages.len()),
        skipped_pages: Vec::new(),
    };

    for page in pages {
        let text = page.text.trim();
        if text.is_empty() {
            continue;
        }

        let Some(resolved) = resolve_page_image(&module.image_dir, page.page) else {
            let issue = PageIssue::MissingImage { page: page.page };
            warn!("{}: {}", module.name, issue);
            if let Some(cb) = progress {
                cb.on_page_skipped(&module.name, page.page, &issue.to_string());
            }
            joined.skipped_pages.push(page.page);
            continue;
        };

        let image = format.place_image(&module.name, page.page, &resolved)?;
        joined.records.push(format.make_record(&image, text));
        joined.images.push(image);
    }

    Ok(joined)
}

/// Build one module's dataset file with `format`, blocking.
pub fn build_with_format<F: RecordFormat>(
    module: &ModuleDescriptor,
    output_dir: &Path,
    format: &F,
    progress: Option<&ProgressCallback>,
) -> Result<ModuleManifest, Pdf2DatasetError> {
    let pages = module.load_pages()?;
    debug!("{}: {} page records", module.name, pages.len());

    std::fs::create_dir_all(output_dir)
        .map_err(|e| Pdf2DatasetError::write_failed(output_dir, e))?;

    let joined = join_records(module, &pages, format, progress)?;
    let kind = format.format();
    let output_file = output_dir.join(format!("{}_{}.json", module.name, kind.file_suffix()));
    write_json_atomic(&output_file, &joined.records)?;

    info!(
        "{}: wrote {} {} records to {} ({} pages skipped)",
        module.name,
        joined.records.len(),
        kind,
        output_file.display(),
        joined.skipped_pages.len()
    );

    Ok(ModuleManifest {
        module: module.name.clone(),
        format: kind,
        output_file,
        records: joined.records.len(),
        skipped_pages: joined.skipped_pages,
        images: joined.images,
    })
}

/// Blocking build of one module in the requested `format`.
pub fn build_module_blocking(
    module: &ModuleDescriptor,
    format: DatasetFormat,
    config: &PipelineConfig,
) -> Result<ModuleManifest, Pdf2DatasetError> {
    let progress = config.progress_callback.as_ref();
    match format {
        DatasetFormat::Llava => build_with_format(
            module,
            &config.output_dir,
            &LlavaFormat::new(&config.instruction),
            progress,
        ),
        DatasetFormat::Qwen => build_with_format(
            module,
            &config.output_dir,
            &QwenFormat::new(&config.instruction, config.pool_dir()),
            progress,
        ),
    }
}

/// Build one module's dataset file on tokio's blocking pool.
pub async fn build_module(
    module: &ModuleDescriptor,
    format: DatasetFormat,
    config: &PipelineConfig,
) -> Result<ModuleManifest, Pdf2DatasetError> {
    let module = module.clone();
    let config = config.clone();
    tokio::task::spawn_blocking(move || build_module_blocking(&module, format, &config))
        .await
        .map_err(|e| Pdf2DatasetError::Internal(format!("Build task panicked: {}", e)))?
}
