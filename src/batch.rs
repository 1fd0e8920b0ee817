//! Batch driver: extraction over many PDFs and dataset builds over many
//! modules, one at a time.
//!
//! A fatal error in one document or module is logged, reported to the
//! progress callback, recorded in [`BatchReport::failed`], and the batch
//! moves on. The builders receive an explicit module list; directory
//! scanning is confined to [`discover_modules`].

use crate::config::{DatasetFormat, PipelineConfig};
use crate::dataset::{build_module, ModuleDescriptor};
use crate::error::Pdf2DatasetError;
use crate::extract::{extract_pdf_blocking, ModuleLayout};
use crate::output::{BatchReport, ExtractionReport, ModuleFailure, ModuleManifest};
use crate::pipeline::{engine, input};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// List the module directories directly under `root`, sorted by name.
///
/// A module whose summary cannot be read is logged and described with the
/// standard layout, so its build fails or succeeds on its own merits.
pub fn discover_modules(root: &Path) -> Result<Vec<ModuleDescriptor>, Pdf2DatasetError> {
    let entries = std::fs::read_dir(root).map_err(|e| {
        Pdf2DatasetError::Internal(format!("cannot list '{}': {}", root.display(), e))
    })?;

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(e) => Some(e.path()),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                None
            }
        })
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let modules = dirs
        .into_iter()
        .filter_map(|dir| match ModuleDescriptor::from_dir(&dir) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("{}: {}; assuming standard layout", dir.display(), e);
                let name = dir.file_name()?.to_string_lossy().into_owned();
                let layout = ModuleLayout {
                    name: name.clone(),
                    dir: dir.clone(),
                };
                Some(ModuleDescriptor::new(
                    name,
                    layout.text_file(),
                    layout.images_dir(),
                ))
            }
        })
        .collect();

    Ok(modules)
}

/// Build every module in `modules`, in order.
pub async fn build_all(
    modules: &[ModuleDescriptor],
    format: DatasetFormat,
    config: &PipelineConfig,
) -> BatchReport<ModuleManifest> {
    let total = modules.len();
    let progress = config.progress_callback.as_ref();
    if let Some(cb) = progress {
        cb.on_batch_start(total);
    }

    let mut report = BatchReport::default();
    for (i, module) in modules.iter().enumerate() {
        info!("Processing {}...", module.name);
        if let Some(cb) = progress {
            cb.on_module_start(&module.name, i + 1, total);
        }

        match build_module(module, format, config).await {
            Ok(manifest) => {
                info!("Created {}", manifest.output_file.display());
                if let Some(cb) = progress {
                    cb.on_module_complete(&module.name, manifest.records);
                }
                report.completed.push(manifest);
            }
            Err(e) => {
                error!("{}: {}", module.name, e);
                if let Some(cb) = progress {
                    cb.on_module_error(&module.name, &e.to_string());
                }
                report.failed.push(ModuleFailure {
                    module: module.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if let Some(cb) = progress {
        cb.on_batch_complete(total, report.completed.len());
    }
    report
}

/// Extract every PDF in `pdfs`, in order, binding pdfium once.
///
/// # Errors
/// Only when pdfium itself cannot be bound; per-document failures land in
/// the report.
pub async fn extract_all(
    pdfs: &[PathBuf],
    config: &PipelineConfig,
) -> Result<BatchReport<ExtractionReport>, Pdf2DatasetError> {
    let pdfs = pdfs.to_vec();
    let config = config.clone();

    tokio::task::spawn_blocking(move || extract_all_blocking(&pdfs, &config))
        .await
        .map_err(|e| Pdf2DatasetError::Internal(format!("Extraction task panicked: {}", e)))?
}

fn extract_all_blocking(
    pdfs: &[PathBuf],
    config: &PipelineConfig,
) -> Result<BatchReport<ExtractionReport>, Pdf2DatasetError> {
    let pdfium = engine::bind_pdfium(config.pdfium_lib_path.as_deref())?;
    let total = pdfs.len();
    let progress = config.progress_callback.as_ref();
    if let Some(cb) = progress {
        cb.on_batch_start(total);
    }

    let mut report = BatchReport::default();
    for (i, pdf) in pdfs.iter().enumerate() {
        let name = input::module_name(pdf).unwrap_or_else(|_| pdf.display().to_string());
        if let Some(cb) = progress {
            cb.on_module_start(&name, i + 1, total);
        }

        match extract_pdf_blocking(&pdfium, pdf, config) {
            Ok(extraction) => {
                if let Some(cb) = progress {
                    cb.on_module_complete(&name, extraction.summary.total_pages);
                }
                report.completed.push(extraction);
            }
            Err(e) => {
                error!("{}: {}", pdf.display(), e);
                if let Some(cb) = progress {
                    cb.on_module_error(&name, &e.to_string());
                }
                report.failed.push(ModuleFailure {
                    module: name,
                    error: e.to_string(),
                });
            }
        }
    }

    if let Some(cb) = progress {
        cb.on_batch_complete(total, report.completed.len());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_lists_directories_sorted() {
        let root = tempfile::tempdir().unwrap();
        for name in ["week2", "week1"] {
            std::fs::create_dir_all(root.path().join(name).join("images")).unwrap();
        }
        std::fs::write(root.path().join("stray.json"), "[]").unwrap();

        let modules = discover_modules(root.path()).unwrap();
        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["week1", "week2"]);
        assert_eq!(
            modules[0].text_file,
            root.path().join("week1/week1_text.json")
        );
    }

    #[test]
    fn discover_falls_back_on_broken_summary() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("m");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("m_summary.json"), "not json").unwrap();

        let modules = discover_modules(root.path()).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].image_dir, dir.join("images"));
    }

    #[test]
    fn discover_missing_root_is_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(discover_modules(&root.path().join("absent")).is_err());
    }
}
