//! Fixed prompt text used in the human/user turn of every record.
//!
//! Callers can override the instruction via
//! [`crate::config::PipelineConfig::instruction`]; the constants here are used
//! only when no override is provided.

/// Default instruction asking the model to explain a course page.
pub const DEFAULT_INSTRUCTION: &str = "Explain the content of this page from the AI course material.";

/// Image placeholder token understood by LLaVA-style trainers.
pub const IMAGE_PLACEHOLDER: &str = "<image>";

/// Build the LLaVA human turn: the image placeholder on its own line,
/// followed by the instruction.
pub fn llava_human_prompt(instruction: &str) -> String {
    format!("{}\n{}", IMAGE_PLACEHOLDER, instruction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_prompt_starts_with_placeholder() {
        let p = llava_human_prompt(DEFAULT_INSTRUCTION);
        assert_eq!(
            p,
            "<image>\nExplain the content of this page from the AI course material."
        );
    }
}
