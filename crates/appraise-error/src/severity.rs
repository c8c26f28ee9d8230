//! Coarse-grained classification for programmatic handling of errors.
//!
//! - Warning: the caller sent something unusable, the service itself is fine
//! - Error: a request failed inside the service
//! - Fatal: the service cannot start or continue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}
