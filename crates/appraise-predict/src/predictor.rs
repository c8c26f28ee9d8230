use std::sync::Arc;

use appraise_core::{FusedEmbedding, PredictedPrice};
use appraise_error::InputError;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::context::ModelContext;
use crate::error::PredictError;

/// Runs the full text + image to price pipeline over a shared [`ModelContext`].
#[derive(Debug, Clone)]
pub struct PricePredictor {
    context: Arc<ModelContext>,
}

impl PricePredictor {
    pub fn new(context: Arc<ModelContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<ModelContext> {
        &self.context
    }

    /// Embeds text and image concurrently on the blocking pool, then fuses and scores.
    ///
    /// Either embedding failing fails the whole prediction; the other task is left to finish
    /// on its own.
    #[instrument(skip_all, fields(text_len = text.len(), image_len = image.len()))]
    pub async fn predict(&self, text: String, image: Vec<u8>) -> Result<PredictedPrice, PredictError> {
        if text.is_empty() {
            return Err(InputError::EmptyText.into());
        }

        let text_ctx = Arc::clone(&self.context);
        let image_ctx = Arc::clone(&self.context);
        let text_task = tokio::task::spawn_blocking(move || text_ctx.embed_text(&text));
        let image_task = tokio::task::spawn_blocking(move || image_ctx.embed_image(&image));

        let (text_embedding, image_embedding) = tokio::try_join!(joined(text_task), joined(image_task))?;

        let fused = FusedEmbedding::fuse(text_embedding, image_embedding);
        let price = self.context.score(&fused)?;
        tracing::info!(%price, fused_dim = fused.dim(), "prediction complete");
        Ok(price)
    }

    /// Same pipeline, run sequentially on the calling thread.
    #[instrument(skip_all, fields(text_len = text.len(), image_len = image.len()))]
    pub fn predict_blocking(&self, text: &str, image: &[u8]) -> Result<PredictedPrice, PredictError> {
        if text.is_empty() {
            return Err(InputError::EmptyText.into());
        }
        let text_embedding = self.context.embed_text(text)?;
        let image_embedding = self.context.embed_image(image)?;

        let fused = FusedEmbedding::fuse(text_embedding, image_embedding);
        let price = self.context.score(&fused)?;
        tracing::info!(%price, fused_dim = fused.dim(), "prediction complete");
        Ok(price)
    }
}

async fn joined<T>(handle: JoinHandle<Result<T, PredictError>>) -> Result<T, PredictError> {
    handle.await?
}
