use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};

use crate::config::ImageModelConfig;
use crate::error::EmbedError;
use crate::local::ModelFiles;
use crate::vision::{ImageEncoder, ImagePreprocessing, PreparedImage};

/// CLIP ViT-B/32 image tower followed by the visual projection.
pub struct ClipImageEncoder {
    model: ClipModel,
    device: Device,
    preprocessing: ImagePreprocessing,
    embedding_dim: usize,
}

impl ClipImageEncoder {
    pub fn load(
        files: &ModelFiles,
        config: &ImageModelConfig,
        device: &Device,
    ) -> Result<Self, EmbedError> {
        let weights = files.get("model.safetensors")?;
        // SAFETY: the weights file is not modified while the process is running.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, device)? };
        let model = ClipModel::new(vb, &ClipConfig::vit_base_patch32())
            .map_err(|e| EmbedError::load("clip model", e))?;

        let mut encoder = Self {
            model,
            device: device.clone(),
            preprocessing: ImagePreprocessing::clip(config.image_size),
            embedding_dim: 0,
        };

        // The projection width is only known from the weights; a blank image reveals it and
        // catches an image_size that does not fit the checkpoint.
        let size = config.image_size as usize;
        let blank = PreparedImage {
            pixels: vec![0.0; 3 * size * size],
            size: config.image_size,
        };
        encoder.embedding_dim = encoder
            .run(&blank)
            .map_err(|e| EmbedError::load("clip probe", e))?
            .len();

        tracing::info!(
            model = %config.model_id,
            embedding_dim = encoder.embedding_dim,
            image_size = config.image_size,
            "image encoder loaded"
        );
        Ok(encoder)
    }

    fn run(&self, image: &PreparedImage) -> Result<Vec<f32>, EmbedError> {
        let size = image.size as usize;
        let pixel_values = Tensor::from_vec(image.pixels.clone(), (1, 3, size, size), &self.device)?;
        let features = self.model.get_image_features(&pixel_values)?;
        Ok(features.squeeze(0)?.to_dtype(DType::F32)?.to_vec1::<f32>()?)
    }
}

impl ImageEncoder for ClipImageEncoder {
    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    fn preprocessing(&self) -> ImagePreprocessing {
        self.preprocessing
    }

    fn forward(&self, image: &PreparedImage) -> Result<Vec<f32>, EmbedError> {
        self.run(image)
    }
}
