use appraise_error::{Error, InputError, ResultExt, TracingPolicy};
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub device: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_price: f64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        device: state.predictor.context().device().to_string(),
    })
}

/// `multipart/form-data` with a `text` field and an `image` file field.
///
/// Bodies over the configured limit are rejected with 413.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PredictResponse>, ApiError> {
    let span = info_span!("predict_request", request_id = %Uuid::new_v4());
    async move {
        let result: appraise_error::Result<_> = async {
            let (text, image) = read_form(multipart).await?;
            let price = state.predictor.predict(text, image).await?;
            Ok(price)
        }
        .await;

        let price = result.emit_event(&TracingPolicy)?;
        Ok(Json(PredictResponse {
            predicted_price: price.value(),
        }))
    }
    .instrument(span)
    .await
}

async fn read_form(mut multipart: Multipart) -> Result<(String, Vec<u8>), Error> {
    let mut text = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("text") => text = Some(field.text().await.map_err(malformed)?),
            Some("image") => image = Some(field.bytes().await.map_err(malformed)?.to_vec()),
            other => tracing::debug!(field = ?other, "ignoring form field"),
        }
    }

    let text = text.ok_or(InputError::MissingField { field: "text" })?;
    let image = image.ok_or(InputError::MissingField { field: "image" })?;
    tracing::debug!(text_len = text.len(), image_len = image.len(), "form parsed");
    Ok((text, image))
}

fn malformed(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return InputError::TooLarge {
            reason: e.body_text(),
        }
        .into();
    }
    InputError::InvalidField {
        field: "multipart".to_string(),
        reason: e.body_text(),
    }
    .into()
}
