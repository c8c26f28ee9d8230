/// Failures raised while running a model over otherwise valid input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("tokenizer failed: {0}")]
    Tokenizer(String),

    #[error("{stage} forward pass failed: {message}")]
    Forward { stage: &'static str, message: String },

    #[error("{stage} dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("regressor produced a non-finite value: {value}")]
    NonFinite { value: f64 },

    #[error("inference task failed: {0}")]
    TaskFailed(String),
}

impl ModelError {
    pub fn forward(stage: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Forward {
            stage,
            message: message.to_string(),
        }
    }
}
