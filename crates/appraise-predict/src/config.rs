use std::path::PathBuf;

use appraise_embed::{DevicePreference, ImageModelConfig, TextModelConfig};
use serde::{Deserialize, Serialize};

/// Everything needed to build a [`crate::ModelContext`] from files.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub device: DevicePreference,
    pub cuda_device_index: usize,
    pub text: TextModelConfig,
    pub image: ImageModelConfig,
    /// Absent means the fused embedding goes to the regressor unchanged.
    pub refinement: Option<RefinementConfig>,
    pub regressor: RegressorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RefinementConfig {
    /// safetensors file with `weight` and optional `bias`
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegressorConfig {
    /// LightGBM JSON model dump
    pub path: PathBuf,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/regressor.json"),
        }
    }
}
