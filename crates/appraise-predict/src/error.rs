use std::path::PathBuf;

use appraise_embed::EmbedError;
use appraise_error::{Error, FatalError, InputError, ModelError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("{stage} dimension mismatch: expected {expected}, got {actual}")]
    Dimension {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("regressor produced a non-finite value: {0}")]
    NonFinite(f64),

    #[error("inference task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Tensor operation failed: {0}")]
    Tensor(#[from] candle_core::Error),

    #[error("refinement forward pass failed: {0}")]
    Refine(#[source] candle_core::Error),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model file {path:?}: {message}")]
    ModelFormat { path: PathBuf, message: String },

    #[error("Invalid model configuration: {0}")]
    Config(String),
}

impl PredictError {
    pub fn format(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::ModelFormat {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<PredictError> for Error {
    fn from(error: PredictError) -> Self {
        match error {
            PredictError::Embed(e) => e.into(),
            PredictError::Input(e) => e.into(),
            PredictError::Dimension {
                stage,
                expected,
                actual,
            } => ModelError::DimensionMismatch {
                stage,
                expected,
                actual,
            }
            .into(),
            PredictError::NonFinite(value) => ModelError::NonFinite { value }.into(),
            PredictError::Task(e) => ModelError::TaskFailed(e.to_string()).into(),
            // tensors are only touched while loading refinement weights
            PredictError::Tensor(e) => FatalError::model_load("refinement", e).into(),
            PredictError::Refine(e) => ModelError::forward("refiner", e).into(),
            PredictError::Io { path, source } => FatalError::FileOperation {
                operation: "read",
                path,
                message: source.to_string(),
            }
            .into(),
            PredictError::ModelFormat { path, message } => {
                FatalError::model_load("regression", format!("{}: {message}", path.display()))
                    .into()
            }
            PredictError::Config(msg) => FatalError::Config(msg).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_input_errors_stay_input_errors() {
        let err: Error = PredictError::from(EmbedError::from(InputError::EmptyText)).into();
        assert!(err.is_input());

        let err: Error = PredictError::from(InputError::UndecodableImage {
            reason: "bad magic".into(),
        })
        .into();
        assert_eq!(err.kind(), "input");
    }

    #[test]
    fn load_failures_are_fatal() {
        let err: Error = PredictError::format("models/regressor.json", "no trees").into();
        assert!(matches!(err, Error::Fatal(FatalError::ModelLoad { .. })));

        let err: Error = PredictError::Io {
            path: "missing.safetensors".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        }
        .into();
        assert!(matches!(
            err,
            Error::Fatal(FatalError::FileOperation { operation: "read", .. })
        ));
    }

    #[test]
    fn refinement_forward_failure_is_a_model_error() {
        let err: Error =
            PredictError::Refine(candle_core::Error::Msg("shape mismatch".into())).into();
        assert!(matches!(
            err,
            Error::Model(ModelError::Forward { stage: "refiner", .. })
        ));
    }

    #[test]
    fn dimension_errors_keep_their_numbers() {
        let err: Error = PredictError::Dimension {
            stage: "regressor",
            expected: 896,
            actual: 384,
        }
        .into();
        assert_eq!(err.to_string(), "regressor dimension mismatch: expected 896, got 384");
    }
}
