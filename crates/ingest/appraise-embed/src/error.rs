use appraise_error::{Error, FatalError, InputError, ModelError};
use candle_core::Error as CandleError;
use hf_hub::api::sync::ApiError as HubError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Tokenizer failed: {0}")]
    Tokenizer(String),
    #[error("Tensor operation failed: {0}")]
    Tensor(#[from] CandleError),
    #[error("{stage} dimension mismatch: expected {expected}, got {actual}")]
    Dimension {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Model download failed: {0}")]
    ModelDownload(#[from] HubError),
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to load {component}: {message}")]
    Load {
        component: &'static str,
        message: String,
    },
    #[error("Invalid embedding configuration: {0}")]
    Config(String),
}

impl EmbedError {
    pub fn load(component: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Load {
            component,
            message: message.to_string(),
        }
    }

    pub fn tokenizer(err: impl std::fmt::Display) -> Self {
        Self::Tokenizer(err.to_string())
    }
}

impl From<EmbedError> for Error {
    fn from(error: EmbedError) -> Self {
        match error {
            EmbedError::Input(e) => e.into(),
            EmbedError::Tokenizer(msg) => ModelError::Tokenizer(msg).into(),
            EmbedError::Tensor(e) => ModelError::forward("encoder", e).into(),
            EmbedError::Dimension {
                stage,
                expected,
                actual,
            } => ModelError::DimensionMismatch {
                stage,
                expected,
                actual,
            }
            .into(),
            // Everything below only happens while loading models.
            EmbedError::ModelDownload(e) => FatalError::model_load("hub", e).into(),
            EmbedError::Io(e) => FatalError::model_load("model file", e).into(),
            EmbedError::Serialization(e) => FatalError::model_load("model config", e).into(),
            EmbedError::Load { component, message } => {
                FatalError::ModelLoad { component, message }.into()
            }
            EmbedError::Config(msg) => FatalError::Config(msg).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_failures_map_to_model_errors() {
        let err: Error = EmbedError::tokenizer("bad merges").into();
        assert!(err.is_model());

        let err: Error = EmbedError::Dimension {
            stage: "text encoder",
            expected: 384,
            actual: 12,
        }
        .into();
        assert!(matches!(
            err,
            Error::Model(ModelError::DimensionMismatch { expected: 384, .. })
        ));
    }

    #[test]
    fn input_errors_pass_through() {
        let err: Error = EmbedError::from(InputError::EmptyText).into();
        assert!(matches!(err, Error::Input(InputError::EmptyText)));
    }

    #[test]
    fn config_errors_are_fatal() {
        let err: Error = EmbedError::Config("stride must be positive".into()).into();
        assert!(matches!(err, Error::Fatal(FatalError::Config(_))));
    }
}
