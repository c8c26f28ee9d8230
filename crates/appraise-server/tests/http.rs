use std::sync::Arc;

use appraise_server::routes::{HealthResponse, PredictResponse};
use appraise_server::{build_router, AppState};
use appraise_test_utils::fixtures::{garbage_bytes, jpeg_bytes, CHAIR_DESCRIPTION};
use appraise_test_utils::mocks::SumRegressor;
use appraise_test_utils::{init_tracing_tests, mock_context, MOCK_FUSED_DIM};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use tracing::Level;

const BOUNDARY: &str = "appraise-test-boundary";

fn app(bias: f64, max_upload_bytes: usize) -> Router {
    let context = mock_context(SumRegressor::new(MOCK_FUSED_DIM, bias));
    build_router(AppState::new(Arc::new(context)), max_upload_bytes)
}

fn multipart_body(text: Option<&str>, image: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(text) = text {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\n{text}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(image) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"item.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(image);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn predict_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_device() {
    init_tracing_tests(Level::INFO);
    let response = app(0.0, 1 << 20)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.device, "cpu");
}

#[tokio::test]
async fn predict_returns_a_price_for_a_chair() {
    let image = jpeg_bytes(100, 100, [140, 100, 70]);
    let response = app(25.0, 1 << 20)
        .oneshot(predict_request(multipart_body(
            Some(CHAIR_DESCRIPTION),
            Some(&image),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: PredictResponse = serde_json::from_value(json_body(response).await).unwrap();
    assert!(body.predicted_price.is_finite());
    assert!(body.predicted_price >= 25.0);
}

#[tokio::test]
async fn missing_image_field_is_a_bad_request() {
    let response = app(0.0, 1 << 20)
        .oneshot(predict_request(multipart_body(Some(CHAIR_DESCRIPTION), None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["kind"], "input");
    assert!(json["error"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn missing_text_field_is_a_bad_request() {
    let image = jpeg_bytes(10, 10, [0, 0, 0]);
    let response = app(0.0, 1 << 20)
        .oneshot(predict_request(multipart_body(None, Some(&image))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].as_str().unwrap().contains("text"));
}

#[tokio::test]
async fn undecodable_image_is_a_bad_request() {
    let response = app(0.0, 1 << 20)
        .oneshot(predict_request(multipart_body(
            Some(CHAIR_DESCRIPTION),
            Some(&garbage_bytes()),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "input");
}

#[tokio::test]
async fn empty_text_is_a_bad_request() {
    let image = jpeg_bytes(10, 10, [0, 0, 0]);
    let response = app(0.0, 1 << 20)
        .oneshot(predict_request(multipart_body(Some(""), Some(&image))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let image = vec![0u8; 64 * 1024];
    let response = app(0.0, 4 * 1024)
        .oneshot(predict_request(multipart_body(
            Some(CHAIR_DESCRIPTION),
            Some(&image),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(response).await["kind"], "input");
}
