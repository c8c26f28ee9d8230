use std::path::PathBuf;

/// Startup failures. Nothing is served until these are resolved.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FatalError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to load {component} model: {message}")]
    ModelLoad {
        component: &'static str,
        message: String,
    },

    #[error("I/O failure on {path:?}: {operation}: {message}")]
    FileOperation {
        operation: &'static str,
        path: PathBuf,
        message: String,
    },
}

impl FatalError {
    pub fn model_load(component: &'static str, message: impl std::fmt::Display) -> Self {
        Self::ModelLoad {
            component,
            message: message.to_string(),
        }
    }
}
