use appraise_core::{EmbeddingShape, FusedEmbedding, ImageEmbedding, PredictedPrice, TextEmbedding};
use appraise_embed::local::{
    device_label, select_device, BertTextEncoder, ClipImageEncoder, HfTokenizer, ModelFiles,
};
use appraise_embed::{ImageEmbedder, TextEmbedder};

use crate::config::ModelConfig;
use crate::error::PredictError;
use crate::refine::{check_input, LinearProjection, Passthrough, Refiner};
use crate::regressor::{Regressor, TreeEnsemble};

/// Read-only handle over every loaded model.
///
/// Built once at startup and shared behind an `Arc`; nothing in here is mutated after
/// construction, so concurrent requests need no locking.
pub struct ModelContext {
    text: TextEmbedder,
    image: ImageEmbedder,
    refiner: Box<dyn Refiner>,
    regressor: Box<dyn Regressor>,
    shape: EmbeddingShape,
    device: String,
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("shape", &self.shape)
            .field("refined_dim", &self.refiner.output_dim())
            .field("device", &self.device)
            .finish()
    }
}

impl ModelContext {
    /// Wires the components together, checking that each stage accepts what the previous one
    /// produces. `refiner = None` installs a [`Passthrough`].
    pub fn new(
        text: TextEmbedder,
        image: ImageEmbedder,
        refiner: Option<Box<dyn Refiner>>,
        regressor: Box<dyn Regressor>,
    ) -> Result<Self, PredictError> {
        let shape = EmbeddingShape::new(text.dimensions(), image.dimensions());
        let refiner: Box<dyn Refiner> = match refiner {
            Some(refiner) => refiner,
            None => Box::new(Passthrough::new(shape.fused_dim())),
        };

        if refiner.input_dim() != shape.fused_dim() {
            return Err(PredictError::Config(format!(
                "refiner expects {} inputs but embeddings are {shape}",
                refiner.input_dim()
            )));
        }
        if regressor.n_features() != refiner.output_dim() {
            return Err(PredictError::Config(format!(
                "regressor expects {} features but refiner produces {}",
                regressor.n_features(),
                refiner.output_dim()
            )));
        }

        tracing::info!(%shape, refined_dim = refiner.output_dim(), "model context ready");
        Ok(Self {
            text,
            image,
            refiner,
            regressor,
            shape,
            device: "cpu".to_string(),
        })
    }

    pub fn with_device_label(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Loads every model named in `config`, downloading hub files on first use.
    pub fn load(config: &ModelConfig) -> Result<Self, PredictError> {
        let device = select_device(config.device, config.cuda_device_index)?;
        let label = device_label(&device, config.cuda_device_index);
        tracing::info!(device = %label, "loading models");

        let text_files = ModelFiles::new(config.text.source())?;
        let tokenizer = HfTokenizer::from_file(text_files.get("tokenizer.json")?)?;
        let encoder = BertTextEncoder::load(&text_files, &config.text, &device)?;
        let text = TextEmbedder::new(Box::new(tokenizer), Box::new(encoder), config.text.chunking)?;

        let image_files = ModelFiles::new(config.image.source())?;
        let image = ImageEmbedder::new(Box::new(ClipImageEncoder::load(
            &image_files,
            &config.image,
            &device,
        )?));

        let refiner: Option<Box<dyn Refiner>> = match &config.refinement {
            Some(refinement) => Some(Box::new(LinearProjection::load(&refinement.path)?)),
            None => None,
        };
        let regressor = Box::new(TreeEnsemble::load(&config.regressor.path)?);

        Ok(Self::new(text, image, refiner, regressor)?.with_device_label(label))
    }

    pub fn shape(&self) -> EmbeddingShape {
        self.shape
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn embed_text(&self, text: &str) -> Result<TextEmbedding, PredictError> {
        Ok(self.text.embed(text)?)
    }

    pub fn embed_image(&self, bytes: &[u8]) -> Result<ImageEmbedding, PredictError> {
        Ok(self.image.embed(bytes)?)
    }

    /// Refine and regress a fused embedding.
    pub fn score(&self, fused: &FusedEmbedding) -> Result<PredictedPrice, PredictError> {
        check_input("fused embedding", self.shape.fused_dim(), fused.as_slice())?;

        let refined = self.refiner.transform(fused.as_slice())?;
        check_input("regressor", self.regressor.n_features(), &refined)?;
        let raw = self.regressor.predict(&refined)?;

        if raw.is_finite() && raw < 0.0 {
            tracing::warn!(raw, "regressor returned a negative price, clamping to 0");
        }
        PredictedPrice::from_raw(raw).map_err(|_| PredictError::NonFinite(raw))
    }
}
