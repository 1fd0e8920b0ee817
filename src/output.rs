//! Serialisable data model: intermediate artifacts, dataset records and the
//! reports returned to callers.
//!
//! Field names of [`PageRecord`], [`ExtractionSummary`], [`LlavaRecord`] and
//! [`QwenRecord`] are part of the on-disk contract read by training tooling;
//! do not rename them.

use crate::config::DatasetFormat;
use crate::error::PageIssue;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ── Extraction artifacts ─────────────────────────────────────────────────

/// Text of one non-blank page (1-indexed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page: u32,
    pub text: String,
}

/// Per-PDF metadata written to `<module>_summary.json`.
///
/// This is the only artifact the dataset builders read to locate a
/// module's text and images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Module name (the PDF's file stem).
    pub pdf_name: String,
    /// Number of pages with non-blank text.
    pub total_pages: usize,
    /// Number of image files written (page renders + embedded images).
    pub total_images: usize,
    /// File name of the text JSON, relative to the module directory.
    pub text_file: String,
    /// Directory holding the image candidates.
    pub image_directory: PathBuf,
}

/// Everything the extractor produced for one PDF.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub summary: ExtractionSummary,
    /// Module directory, `<extracted_root>/<module>/`.
    pub module_dir: PathBuf,
    /// Recoverable problems met along the way.
    pub issues: Vec<PageIssue>,
}

// ── LLaVA records ────────────────────────────────────────────────────────

/// One turn of a LLaVA conversation (`from` is `human` or `gpt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlavaTurn {
    pub from: String,
    pub value: String,
}

/// A flat LLaVA training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlavaRecord {
    pub id: Uuid,
    pub image: PathBuf,
    pub conversations: Vec<LlavaTurn>,
}

// ── Qwen records ─────────────────────────────────────────────────────────

/// One block of a Qwen user turn: either `{"image": path}` or `{"text": s}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QwenBlock {
    Image { image: PathBuf },
    Text { text: String },
}

/// Content of a Qwen turn: user turns carry blocks, assistant turns a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QwenContent {
    Blocks(Vec<QwenBlock>),
    Text(String),
}

/// One role-tagged Qwen turn (`role` is `user` or `assistant`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QwenMessage {
    pub role: String,
    pub content: QwenContent,
}

/// A Qwen-VL training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QwenRecord {
    pub id: Uuid,
    pub conversations: Vec<QwenMessage>,
}

impl QwenRecord {
    /// Image path referenced by the user turn, if any.
    pub fn image(&self) -> Option<&Path> {
        self.conversations.iter().find_map(|m| match &m.content {
            QwenContent::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                QwenBlock::Image { image } => Some(image.as_path()),
                QwenBlock::Text { .. } => None,
            }),
            QwenContent::Text(_) => None,
        })
    }
}

// ── Reports ──────────────────────────────────────────────────────────────

/// What one dataset build produced for one module.
///
/// Returned instead of inferring "already done" from file existence.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleManifest {
    pub module: String,
    pub format: DatasetFormat,
    pub output_file: PathBuf,
    pub records: usize,
    /// Pages with text that were dropped because no image resolved.
    pub skipped_pages: Vec<u32>,
    /// Image paths referenced by the emitted records, in record order.
    pub images: Vec<PathBuf>,
}

/// A module or document that failed fatally during a batch.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleFailure {
    pub module: String,
    pub error: String,
}

/// Result of a batch run: successes in input order plus failures.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<T> {
    pub completed: Vec<T>,
    pub failed: Vec<ModuleFailure>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            completed: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    /// Total modules attempted.
    pub fn attempted(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn page_record_wire_format() {
        let r = PageRecord {
            page: 3,
            text: "Intro".into(),
        };
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"page": 3, "text": "Intro"})
        );
    }

    #[test]
    fn qwen_record_wire_format() {
        let id = Uuid::nil();
        let r = QwenRecord {
            id,
            conversations: vec![
                QwenMessage {
                    role: "user".into(),
                    content: QwenContent::Blocks(vec![
                        QwenBlock::Image {
                            image: PathBuf::from("out/images/m_page_1.png"),
                        },
                        QwenBlock::Text {
                            text: "Explain".into(),
                        },
                    ]),
                },
                QwenMessage {
                    role: "assistant".into(),
                    content: QwenContent::Text("Answer".into()),
                },
            ],
        };
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "conversations": [
                    {"role": "user", "content": [
                        {"image": "out/images/m_page_1.png"},
                        {"text": "Explain"}
                    ]},
                    {"role": "assistant", "content": "Answer"}
                ]
            })
        );
        assert_eq!(r.image(), Some(Path::new("out/images/m_page_1.png")));
    }

    #[test]
    fn qwen_record_parses_back() {
        let raw = r#"{"id":"00000000-0000-0000-0000-000000000000","conversations":[
            {"role":"user","content":[{"image":"a.png"},{"text":"t"}]},
            {"role":"assistant","content":"x"}]}"#;
        let r: QwenRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(r.conversations[1].content, QwenContent::Text("x".into()));
        assert_eq!(r.image(), Some(Path::new("a.png")));
    }

    #[test]
    fn batch_report_counts() {
        let mut report: BatchReport<u8> = BatchReport::default();
        report.completed.push(1);
        report.failed.push(ModuleFailure {
            module: "m".into(),
            error: "e".into(),
        });
        assert_eq!(report.attempted(), 2);
    }
}
