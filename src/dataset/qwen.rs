//! Qwen-VL records: role-tagged turns with image + text content blocks.
//!
//! Every referenced image is copied into a shared pool under
//! `<module>_page_<N>.png`. Prefixing the module name keeps pages of
//! different modules apart; re-running overwrites the same pool files.

use super::RecordFormat;
use crate::config::DatasetFormat;
use crate::error::Pdf2DatasetError;
use crate::output::{QwenBlock, QwenContent, QwenMessage, QwenRecord};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Pool file name for `page` of `module`.
pub fn pool_image_name(module: &str, page: u32) -> String {
    format!("{}_page_{}.png", module, page)
}

/// Copies each resolved image into `pool_dir` and references the copy.
#[derive(Debug, Clone)]
pub struct QwenFormat {
    instruction: String,
    pool_dir: PathBuf,
}

impl QwenFormat {
    pub fn new(instruction: &str, pool_dir: impl Into<PathBuf>) -> Self {
        Self {
            instruction: instruction.to_string(),
            pool_dir: pool_dir.into(),
        }
    }
}

impl RecordFormat for QwenFormat {
    type Record = QwenRecord;

    fn format(&self) -> DatasetFormat {
        DatasetFormat::Qwen
    }

    fn place_image(
        &self,
        module: &str,
        page: u32,
        resolved: &Path,
    ) -> Result<PathBuf, Pdf2DatasetError> {
        std::fs::create_dir_all(&self.pool_dir)
            .map_err(|e| Pdf2DatasetError::write_failed(&self.pool_dir, e))?;

        let target = self.pool_dir.join(pool_image_name(module, page));
        std::fs::copy(resolved, &target).map_err(|e| Pdf2DatasetError::ImageCopyFailed {
            from: resolved.to_path_buf(),
            to: target.clone(),
            source: e,
        })?;
        debug!("Pooled {} → {}", resolved.display(), target.display());
        Ok(target)
    }

    fn make_record(&self, image: &Path, text: &str) -> QwenRecord {
        QwenRecord {
            id: Uuid::new_v4(),
            conversations: vec![
                QwenMessage {
                    role: "user".into(),
                    content: QwenContent::Blocks(vec![
                        QwenBlock::Image {
                            image: image.to_path_buf(),
                        },
                        QwenBlock::Text {
                            text: self.instruction.clone(),
                        },
                    ]),
                },
                QwenMessage {
                    role: "assistant".into(),
                    content: QwenContent::Text(text.to_string()),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_names_are_module_scoped() {
        assert_eq!(pool_image_name("week1", 3), "week1_page_3.png");
        assert_ne!(pool_image_name("week1", 3), pool_image_name("week2", 3));
        assert_ne!(pool_image_name("week1", 3), pool_image_name("week1", 4));
    }

    #[test]
    fn place_image_copies_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("page_1.png");
        std::fs::write(&src, b"first").unwrap();

        let f = QwenFormat::new("Explain", dir.path().join("pool"));
        let placed = f.place_image("m", 1, &src).unwrap();
        assert_eq!(placed, dir.path().join("pool/m_page_1.png"));
        assert_eq!(std::fs::read(&placed).unwrap(), b"first");
        assert!(src.exists(), "source must be left in place");

        std::fs::write(&src, b"second").unwrap();
        let again = f.place_image("m", 1, &src).unwrap();
        assert_eq!(again, placed);
        assert_eq!(std::fs::read(&placed).unwrap(), b"second");
    }

    #[test]
    fn place_image_reports_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let f = QwenFormat::new("Explain", dir.path().join("pool"));
        let err = f
            .place_image("m", 9, &dir.path().join("gone.png"))
            .unwrap_err();
        assert!(matches!(err, Pdf2DatasetError::ImageCopyFailed { .. }));
    }

    #[test]
    fn record_references_pool_path() {
        let f = QwenFormat::new("Explain", "out/images");
        let r = f.make_record(Path::new("out/images/m_page_2.png"), "Body");
        assert_eq!(r.image(), Some(Path::new("out/images/m_page_2.png")));
        assert_eq!(r.conversations[0].role, "user");
        assert_eq!(
            r.conversations[1].content,
            QwenContent::Text("Body".into())
        );
    }
}
