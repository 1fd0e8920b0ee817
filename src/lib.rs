//! # pdf2dataset
//!
//! Turn PDF course documents into supervised-training conversation records
//! that pair a page image with the page's text, in LLaVA or Qwen-VL format.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract  per-page text JSON + page renders + embedded images
//!  │              → extracted_content/<module>/
//!  ├─ 2. Resolve  pick one image per page (full-page render preferred)
//!  ├─ 3. Build    one conversation record per page with text and image
//!  │              → <output_dir>/<module>_llava.json | <module>_qwen.json
//!  └─ 4. Pool     (Qwen) copy images to <output_dir>/images/<module>_page_<N>.png
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2dataset::{build_all, discover_modules, extract_all, DatasetFormat, PipelineConfig};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder().output_dir("llava_training_data").build()?;
//!
//!     let pdfs = vec![PathBuf::from("Class docs/week1.pdf")];
//!     let extracted = extract_all(&pdfs, &config).await?;
//!     eprintln!("extracted {} PDFs", extracted.completed.len());
//!
//!     let modules = discover_modules(&config.extracted_root)?;
//!     let report = build_all(&modules, DatasetFormat::Llava, &config).await;
//!     for m in &report.completed {
//!         println!("{} → {} records", m.module, m.records);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2dataset` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! pdfium is loaded at runtime: set `PDFIUM_LIB_PATH` or
//! [`PipelineConfig::pdfium_lib_path`], or install it on the library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod chat;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod output;
pub mod persist;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{build_all, discover_modules, extract_all};
pub use chat::{ChatConfig, ChatModel, ChatReply, ChatRole, ChatTurn, LlmChatModel};
pub use config::{DatasetFormat, PipelineConfig, PipelineConfigBuilder};
pub use dataset::{build_module, build_module_blocking, pool_image_name, ModuleDescriptor};
pub use error::{PageIssue, Pdf2DatasetError};
pub use extract::{extract_pdf, extract_pdf_sync};
pub use output::{
    BatchReport, ExtractionReport, ExtractionSummary, LlavaRecord, ModuleFailure, ModuleManifest,
    PageRecord, QwenRecord,
};
pub use pipeline::resolve::resolve_page_image;
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
