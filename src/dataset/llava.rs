//! LLaVA-style records: flat `image` field plus `from/value` turns.

use super::RecordFormat;
use crate::config::DatasetFormat;
use crate::error::Pdf2DatasetError;
use crate::output::{LlavaRecord, LlavaTurn};
use crate::prompts::llava_human_prompt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// References each resolved image at its original extracted location.
#[derive(Debug, Clone)]
pub struct LlavaFormat {
    human_prompt: String,
}

impl LlavaFormat {
    pub fn new(instruction: &str) -> Self {
        Self {
            human_prompt: llava_human_prompt(instruction),
        }
    }
}

impl RecordFormat for LlavaFormat {
    type Record = LlavaRecord;

    fn format(&self) -> DatasetFormat {
        DatasetFormat::Llava
    }

    fn place_image(
        &self,
        _module: &str,
        _page: u32,
        resolved: &Path,
    ) -> Result<PathBuf, Pdf2DatasetError> {
        Ok(resolved.to_path_buf())
    }

    fn make_record(&self, image: &Path, text: &str) -> LlavaRecord {
        LlavaRecord {
            id: Uuid::new_v4(),
            image: image.to_path_buf(),
            conversations: vec![
                LlavaTurn {
                    from: "human".into(),
                    value: self.human_prompt.clone(),
                },
                LlavaTurn {
                    from: "gpt".into(),
                    value: text.to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_shape() {
        let f = LlavaFormat::new("Explain this page.");
        let r = f.make_record(Path::new("ex/m/images/page_1.png"), "Intro");
        let mut v = serde_json::to_value(&r).unwrap();
        v.as_object_mut().unwrap().remove("id");
        assert_eq!(
            v,
            json!({
                "image": "ex/m/images/page_1.png",
                "conversations": [
                    {"from": "human", "value": "<image>\nExplain this page."},
                    {"from": "gpt", "value": "Intro"}
                ]
            })
        );
    }

    #[test]
    fn ids_are_fresh() {
        let f = LlavaFormat::new("x");
        let a = f.make_record(Path::new("a.png"), "t");
        let b = f.make_record(Path::new("a.png"), "t");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn image_is_not_moved() {
        let f = LlavaFormat::new("x");
        let placed = f.place_image("m", 1, Path::new("ex/m/images/page_1.png")).unwrap();
        assert_eq!(placed, Path::new("ex/m/images/page_1.png"));
    }
}
