//! Policies for classifying and emitting errors.
//!
//! Library crates return [`crate::Result`] and never log errors themselves; the application
//! installs an `ErrorPolicy` at its boundary (the HTTP handlers) to decide how failures are
//! reported.
//!
//! Example
//! ```rust
//! use appraise_error::{Error, ErrorPolicy, InputError, Severity};
//!
//! struct PrintPolicy;
//! impl ErrorPolicy for PrintPolicy {
//!     fn classify(&self, e: &Error) -> Severity { e.severity() }
//!     fn emit(&self, e: &Error) { eprintln!("[{:?}] {e}", self.classify(e)); }
//! }
//!
//! let err: Error = InputError::EmptyText.into();
//! assert_eq!(PrintPolicy.classify(&err), Severity::Warning);
//! ```
use super::{Error, Severity};

pub trait ErrorPolicy: Send + Sync {
    /// Classify the error's severity
    fn classify(&self, error: &Error) -> Severity;

    /// Emit the error according to the policy
    fn emit(&self, error: &Error);
}

/// Classifies by the error's own severity and emits nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopPolicy;

impl ErrorPolicy for NoopPolicy {
    fn classify(&self, error: &Error) -> Severity {
        error.severity()
    }

    fn emit(&self, _error: &Error) {}
}

/// Emits through `tracing`: client mistakes at WARN, everything else at ERROR.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Default)]
pub struct TracingPolicy;

#[cfg(feature = "tracing")]
impl ErrorPolicy for TracingPolicy {
    fn classify(&self, error: &Error) -> Severity {
        error.severity()
    }

    fn emit(&self, error: &Error) {
        use tracing::{Level, event};

        match self.classify(error) {
            Severity::Warning => event!(Level::WARN, kind = error.kind(), error = %error),
            Severity::Error | Severity::Fatal => {
                event!(Level::ERROR, kind = error.kind(), error = %error)
            }
        }
    }
}
