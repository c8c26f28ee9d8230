use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TEXT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_IMAGE_MODEL: &str = "openai/clip-vit-base-patch32";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePreference {
    /// CUDA when available, otherwise CPU.
    #[default]
    Auto,
    Cpu,
    Cuda,
}

/// Where model files come from: a local directory if set, otherwise the Hugging Face hub.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelSource {
    pub model_id: String,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub local_dir: Option<PathBuf>,
}

impl ModelSource {
    pub fn hub(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            revision: None,
            local_dir: None,
        }
    }
}

/// Window geometry for long text.
///
/// `max_length` is the full encoder input length including special tokens. `stride` is the
/// distance between the start offsets of consecutive windows, so neighbouring windows share
/// `content_length - stride` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_length: usize,
    pub stride: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_length: 512,
            stride: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TextModelConfig {
    // inline rather than a flattened `ModelSource`: flattened fields ignore the container
    // default, so a partial table would lose this model's id
    pub model_id: String,
    pub revision: Option<String>,
    pub local_dir: Option<PathBuf>,
    pub chunking: ChunkingConfig,
    /// Load `pytorch_model.bin` instead of `model.safetensors`.
    pub use_pth: bool,
    pub approximate_gelu: bool,
}

impl TextModelConfig {
    pub fn source(&self) -> ModelSource {
        ModelSource {
            model_id: self.model_id.clone(),
            revision: self.revision.clone(),
            local_dir: self.local_dir.clone(),
        }
    }
}

impl Default for TextModelConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_TEXT_MODEL.to_string(),
            revision: None,
            local_dir: None,
            chunking: ChunkingConfig::default(),
            use_pth: false,
            approximate_gelu: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageModelConfig {
    pub model_id: String,
    pub revision: Option<String>,
    pub local_dir: Option<PathBuf>,
    pub image_size: u32,
}

impl ImageModelConfig {
    pub fn source(&self) -> ModelSource {
        ModelSource {
            model_id: self.model_id.clone(),
            revision: self.revision.clone(),
            local_dir: self.local_dir.clone(),
        }
    }
}

impl Default for ImageModelConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_IMAGE_MODEL.to_string(),
            // safetensors weights for the base CLIP checkpoint live on this PR ref
            revision: Some("refs/pr/15".to_string()),
            local_dir: None,
            image_size: 224,
        }
    }
}
