/// Failures caused by what the caller sent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("text input is empty")]
    EmptyText,

    #[error("text produced no tokens")]
    NoTokens,

    #[error("image input is empty")]
    EmptyImage,

    #[error("unreadable image: {reason}")]
    UndecodableImage { reason: String },

    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("upload too large: {reason}")]
    TooLarge { reason: String },
}
