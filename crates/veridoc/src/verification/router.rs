use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    DocumentAsset, DocumentId, DocumentType, MerchantDetails, OcrExtraction, RegistryRecord,
    VerificationRequest,
};
use super::service::VerificationService;

/// Router builder exposing the verification endpoint.
pub fn verification_router(service: Arc<VerificationService>) -> Router {
    Router::new()
        .route("/api/v1/verifications", post(verify_handler))
        .with_state(service)
}

/// Error raised while turning a wire submission into a verification request.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("content_base64 is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Wire shape for a verification submission: raw document bytes ride as
/// base64 alongside the already-resolved collaborator outputs.
#[derive(Debug, Deserialize)]
pub(crate) struct VerificationSubmission {
    pub(crate) document_id: String,
    pub(crate) document_type: DocumentType,
    pub(crate) mime_type: String,
    pub(crate) content_base64: String,
    #[serde(default)]
    pub(crate) ocr: OcrExtraction,
    #[serde(default)]
    pub(crate) registry: RegistryRecord,
    #[serde(default)]
    pub(crate) merchant: MerchantDetails,
}

pub(crate) async fn verify_handler(
    State(service): State<Arc<VerificationService>>,
    axum::Json(submission): axum::Json<VerificationSubmission>,
) -> Response {
    let bytes = match base64::engine::general_purpose::STANDARD
        .decode(&submission.content_base64)
        .map_err(SubmissionError::from)
    {
        Ok(bytes) => bytes,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    let request = VerificationRequest {
        document_type: submission.document_type,
        asset: DocumentAsset::decode(
            DocumentId(submission.document_id),
            &submission.mime_type,
            bytes,
        ),
        ocr: submission.ocr,
        registry: submission.registry,
        merchant: submission.merchant,
    };

    // The battery is CPU-bound; keep it off the async worker threads.
    let outcome = tokio::task::spawn_blocking(move || service.verify(request)).await;

    match outcome {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": format!("verification task failed: {error}"),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
