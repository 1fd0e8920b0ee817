//! Configuration types for PDF extraction and dataset building.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. Callers set only what they care about and
//! rely on the documented defaults for the rest.

use crate::error::Pdf2DatasetError;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_INSTRUCTION;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration shared by the extractor, the dataset builders and the
/// batch driver.
///
/// # Example
/// ```rust
/// use pdf2dataset::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .extracted_root("extracted_content")
///     .output_dir("llava_training_data")
///     .dpi(150)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Root under which one `<module>/` directory per PDF is written.
    /// Default: `extracted_content`.
    pub extracted_root: PathBuf,

    /// Directory receiving `<module>_llava.json` / `<module>_qwen.json` and,
    /// for the Qwen format, the `images/` pool. Default: `training_data`.
    pub output_dir: PathBuf,

    /// Instruction placed in the human/user turn of every record.
    pub instruction: String,

    /// Rendering DPI for the full-page image. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// Caps either dimension independently of DPI so a poster-sized page
    /// never allocates an enormous bitmap.
    pub max_rendered_pixels: u32,

    /// Save embedded image objects as `page_<N>_img_<K>.<ext>`. Default: true.
    pub extract_embedded_images: bool,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit pdfium library file or directory. When `None` the working
    /// directory and then the system library path are tried.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Optional progress sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extracted_root: PathBuf::from("extracted_content"),
            output_dir: PathBuf::from("training_data"),
            instruction: DEFAULT_INSTRUCTION.to_string(),
            dpi: 150,
            max_rendered_pixels: 2000,
            extract_embedded_images: true,
            password: None,
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("extracted_root", &self.extracted_root)
            .field("output_dir", &self.output_dir)
            .field("instruction", &self.instruction)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("extract_embedded_images", &self.extract_embedded_images)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Directory where the Qwen builder pools its images.
    pub fn pool_dir(&self) -> PathBuf {
        self.output_dir.join("images")
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn extracted_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.extracted_root = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.config.instruction = text.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.clamp(100, i32::MAX as u32);
        self
    }

    pub fn extract_embedded_images(mut self, v: bool) -> Self {
        self.config.extract_embedded_images = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Pdf2DatasetError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2DatasetError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.instruction.trim().is_empty() {
            return Err(Pdf2DatasetError::InvalidConfig(
                "Instruction must not be empty".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() || c.extracted_root.as_os_str().is_empty() {
            return Err(Pdf2DatasetError::InvalidConfig(
                "Output and extracted-content directories must be set".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Target dataset schema.
///
/// | Format | Record shape | Image reference |
/// |--------|--------------|-----------------|
/// | `Llava` | flat `image` + `from/value` turns | original extracted path |
/// | `Qwen`  | `role/content` with image + text blocks | pooled copy under `<output_dir>/images/` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Llava,
    Qwen,
}

impl DatasetFormat {
    /// Suffix of the per-module output file: `<module>_<suffix>.json`.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            DatasetFormat::Llava => "llava",
            DatasetFormat::Qwen => "qwen",
        }
    }
}

impl fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_layout() {
        let c = PipelineConfig::default();
        assert_eq!(c.extracted_root, PathBuf::from("extracted_content"));
        assert_eq!(c.pool_dir(), PathBuf::from("training_data").join("images"));
        assert_eq!(c.instruction, DEFAULT_INSTRUCTION);
        assert!(c.extract_embedded_images);
    }

    #[test]
    fn builder_clamps_dpi() {
        let c = PipelineConfig::builder().dpi(1000).build().unwrap();
        assert_eq!(c.dpi, 400);
        let c = PipelineConfig::builder().dpi(10).build().unwrap();
        assert_eq!(c.dpi, 72);
    }

    #[test]
    fn builder_clamps_max_pixels_to_renderer_range() {
        let c = PipelineConfig::builder()
            .max_rendered_pixels(3_000_000_000)
            .build()
            .unwrap();
        assert_eq!(c.max_rendered_pixels, i32::MAX as u32);
        let c = PipelineConfig::builder().max_rendered_pixels(5).build().unwrap();
        assert_eq!(c.max_rendered_pixels, 100);
    }

    #[test]
    fn builder_rejects_blank_instruction() {
        let err = PipelineConfig::builder().instruction("   ").build().unwrap_err();
        assert!(matches!(err, Pdf2DatasetError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_password() {
        let c = PipelineConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn format_suffixes() {
        assert_eq!(DatasetFormat::Llava.file_suffix(), "llava");
        assert_eq!(DatasetFormat::Qwen.to_string(), "qwen");
        assert_eq!(
            serde_json::to_string(&DatasetFormat::Qwen).unwrap(),
            "\"qwen\""
        );
    }
}
