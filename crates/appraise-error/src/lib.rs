pub mod fatal;
pub mod input;
pub mod model;
pub mod policy;
pub mod result_ext;
pub mod severity;

// public exports
pub use fatal::FatalError;
pub use input::InputError;
pub use model::ModelError;
pub use policy::{ErrorPolicy, NoopPolicy};
#[cfg(feature = "tracing")]
pub use policy::TracingPolicy;
pub use result_ext::ResultExt;
pub use severity::Severity;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Workspace-wide error.
///
/// `Input` failures are caused by the caller (bad text, bad image, missing fields) and are
/// surfaced as client errors at the HTTP boundary. `Model` failures come from inference itself
/// and `Fatal` failures from startup (config, model loading).
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl Error {
    pub fn severity(&self) -> Severity {
        match self {
            Error::Input(_) => Severity::Warning,
            Error::Model(_) => Severity::Error,
            Error::Fatal(_) => Severity::Fatal,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Error::Input(_))
    }

    pub fn is_model(&self) -> bool {
        matches!(self, Error::Model(_))
    }

    /// Short machine-readable label, used in HTTP error bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Input(_) => "input",
            Error::Model(_) => "model",
            Error::Fatal(_) => "fatal",
        }
    }
}
