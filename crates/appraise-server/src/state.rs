use std::sync::Arc;

use appraise_predict::{ModelContext, PricePredictor};

/// Shared by every handler; cloning only bumps the context's reference count.
#[derive(Debug, Clone)]
pub struct AppState {
    pub predictor: PricePredictor,
}

impl AppState {
    pub fn new(context: Arc<ModelContext>) -> Self {
        Self {
            predictor: PricePredictor::new(context),
        }
    }
}
