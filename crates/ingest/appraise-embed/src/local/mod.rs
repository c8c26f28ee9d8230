//! Local inference backends built on candle.
//!
//! Weights are read from `local_dir` when configured, otherwise fetched (and cached) through the
//! Hugging Face hub.

pub mod bert;
pub mod clip;

use std::path::PathBuf;

use candle_core::Device;
use hf_hub::{api::sync::Api, Repo, RepoType};

use crate::config::{DevicePreference, ModelSource};
use crate::error::EmbedError;

pub use bert::{BertTextEncoder, HfTokenizer};
pub use clip::ClipImageEncoder;

pub fn select_device(
    preference: DevicePreference,
    cuda_device_index: usize,
) -> Result<Device, EmbedError> {
    match preference {
        DevicePreference::Cpu => Ok(Device::Cpu),
        DevicePreference::Cuda => Ok(Device::new_cuda(cuda_device_index)?),
        DevicePreference::Auto => Ok(Device::cuda_if_available(cuda_device_index)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "CUDA not available, falling back to CPU");
                Device::Cpu
            })),
    }
}

/// Identifier reported by the health endpoint.
pub fn device_label(device: &Device, cuda_device_index: usize) -> String {
    if device.is_cuda() {
        format!("cuda:{cuda_device_index}")
    } else if device.is_metal() {
        "metal".to_string()
    } else {
        "cpu".to_string()
    }
}

/// Resolves named files of one model, downloading them if needed.
pub struct ModelFiles {
    source: ModelSource,
    api: Option<Api>,
}

impl ModelFiles {
    pub fn new(source: ModelSource) -> Result<Self, EmbedError> {
        let api = match source.local_dir {
            Some(_) => None,
            None => Some(Api::new()?),
        };
        Ok(Self { source, api })
    }

    pub fn get(&self, file: &str) -> Result<PathBuf, EmbedError> {
        if let Some(dir) = &self.source.local_dir {
            let path = dir.join(file);
            if !path.is_file() {
                return Err(EmbedError::load(
                    "model file",
                    format!("{} does not exist", path.display()),
                ));
            }
            return Ok(path);
        }

        let api = self
            .api
            .as_ref()
            .ok_or_else(|| EmbedError::load("hub", "hub client not initialized"))?;
        let repo = match &self.source.revision {
            Some(rev) => Repo::with_revision(self.source.model_id.clone(), RepoType::Model, rev.clone()),
            None => Repo::new(self.source.model_id.clone(), RepoType::Model),
        };
        tracing::debug!(model = %self.source.model_id, file, "resolving model file via hub");
        Ok(api.repo(repo).get(file)?)
    }
}
