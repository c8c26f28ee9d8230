use super::{ErrorPolicy, Result};

/// Extension trait for `Result` enabling policy-driven emission without
/// changing control flow.
///
/// Example
/// ```rust
/// use appraise_error::{InputError, NoopPolicy, Result, ResultExt};
///
/// fn parse_field(policy: &NoopPolicy) -> Result<()> {
///     let r: Result<()> = Err(InputError::MissingField { field: "text" }.into());
///     r.emit_event(policy) // emitted according to policy, still Err for the caller
/// }
/// assert!(parse_field(&NoopPolicy).is_err());
/// ```
pub trait ResultExt<T> {
    /// Emit the error using the provided policy and return the result unchanged
    fn emit_event(self, policy: &impl ErrorPolicy) -> Self;

    /// Emit only if the policy classifies the error at or above `Severity::Error`
    fn emit_if_severe(self, policy: &impl ErrorPolicy) -> Self;
}

impl<T> ResultExt<T> for Result<T> {
    fn emit_event(self, policy: &impl ErrorPolicy) -> Self {
        if let Err(ref e) = self {
            policy.emit(e);
        }
        self
    }

    fn emit_if_severe(self, policy: &impl ErrorPolicy) -> Self {
        if let Err(ref e) = self {
            if policy.classify(e) != super::Severity::Warning {
                policy.emit(e);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{Error, InputError, ModelError, Severity};

    #[derive(Default)]
    struct CountingPolicy {
        emitted: AtomicUsize,
    }

    impl ErrorPolicy for CountingPolicy {
        fn classify(&self, error: &Error) -> Severity {
            error.severity()
        }

        fn emit(&self, _error: &Error) {
            self.emitted.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn emit_if_severe_skips_input_errors() {
        let policy = CountingPolicy::default();

        let input: Result<()> = Err(InputError::EmptyImage.into());
        let model: Result<()> = Err(ModelError::TaskFailed("panic".into()).into());
        let ok: Result<u8> = Ok(3);

        assert!(input.emit_if_severe(&policy).is_err());
        assert!(model.emit_if_severe(&policy).is_err());
        assert_eq!(ok.emit_event(&policy).ok(), Some(3));
        assert_eq!(policy.emitted.load(Ordering::SeqCst), 1);
    }
}
