use appraise_error::{Error, InputError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Wraps a workspace error so handlers can return it directly.
#[derive(Debug)]
pub struct ApiError(pub Error);

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::Input(InputError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Input(_) => StatusCode::BAD_REQUEST,
            Error::Model(_) | Error::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E: Into<Error>> From<E> for ApiError {
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.0.kind(),
        };
        (self.status(), Json(body)).into_response()
    }
}
