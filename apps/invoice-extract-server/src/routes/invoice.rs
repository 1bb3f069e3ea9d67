//! Invoice processing endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::extraction::{Extraction, ProcessingRequest};
use crate::state::AppState;

/// Create the invoice router
pub fn router() -> Router<AppState> {
    Router::new().route("/invoice_process", post(process_invoice))
}

/// Resolve the document, run the model and return its normalized output
///
/// A JSON recovery failure still answers 200 with the diagnostic body.
async fn process_invoice(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProcessingRequest>, JsonRejection>,
) -> Result<Extraction> {
    let Json(request) = payload?;

    let span = tracing::info_span!("invoice_process", request_id = %Uuid::new_v4());
    async move {
        tracing::info!(
            model = request.model_name(),
            output_format = ?request.output_format(),
            "Processing invoice request"
        );
        tracing::debug!("Request: {:?}", request);

        state.extraction().process(&request).await
    }
    .instrument(span)
    .await
}

impl IntoResponse for Extraction {
    fn into_response(self) -> Response {
        match self {
            Extraction::Structured(value) => Json(value).into_response(),
            Extraction::Text(text) => Json(json!({ "result": text })).into_response(),
            Extraction::Diagnostic(diagnostic) => Json(diagnostic).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use base64::Engine;
    use serde_json::Value;
    use std::sync::Arc;

    use crate::gemini::MockGenerator;
    use crate::routes::test_support;
    use crate::storage::MockFetcher;

    fn server(fetcher: MockFetcher, generator: Arc<MockGenerator>) -> TestServer {
        TestServer::new(crate::routes::router(test_support::state(fetcher, generator))).unwrap()
    }

    fn pdf_fetcher() -> MockFetcher {
        MockFetcher::default().with_object("docs", "inv.pdf", b"%PDF-1.4")
    }

    #[tokio::test]
    async fn test_fenced_json_is_returned_unwrapped() {
        let generator = Arc::new(MockGenerator::replying(
            "```json\n{\"invoice_number\":\"INV-1\"}\n```",
        ));
        let server = server(pdf_fetcher(), generator.clone());

        let response = server
            .post("/invoice_process")
            .json(&json!({ "api_key": "k", "s3_bucket": "docs", "s3_key": "inv.pdf" }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "invoice_number": "INV-1" }));
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_inline_base64_document() {
        let generator = Arc::new(MockGenerator::replying("[{\"item\": \"a\"}]"));
        let server = server(MockFetcher::default(), generator.clone());
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"%PDF-inline");

        let response = server
            .post("/invoice_process")
            .json(&json!({ "api_key": "k", "file_content": encoded }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!([{ "item": "a" }]));
        assert_eq!(generator.calls()[0].0, b"%PDF-inline");
    }

    #[tokio::test]
    async fn test_inline_document_with_fenced_reply() {
        let generator = Arc::new(MockGenerator::replying("```json\n{\"a\":1}\n```"));
        let server = server(MockFetcher::default(), generator.clone());
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4 inline");

        let response = server
            .post("/invoice_process")
            .json(&json!({
                "api_key": "k",
                "file_content": encoded,
                "output_format": "json"
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "a": 1 }));

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, b"%PDF-1.4 inline");
    }

    #[tokio::test]
    async fn test_text_output_is_wrapped() {
        let server = server(
            pdf_fetcher(),
            Arc::new(MockGenerator::replying("Invoice INV-1 totals 100")),
        );

        let response = server
            .post("/invoice_process")
            .json(&json!({
                "api_key": "k",
                "s3_bucket": "docs",
                "s3_key": "inv.pdf",
                "output_format": "TEXT"
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "result": "Invoice INV-1 totals 100" }));
    }

    #[tokio::test]
    async fn test_unparseable_output_returns_diagnostic() {
        let server = server(
            pdf_fetcher(),
            Arc::new(MockGenerator::replying("Sorry, I cannot read this document.")),
        );

        let response = server
            .post("/invoice_process")
            .json(&json!({ "api_key": "k", "s3_bucket": "docs", "s3_key": "inv.pdf" }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "error": "Failed to parse JSON response",
            "raw_result": "Sorry, I cannot read this document.",
            "parsing_attempts": ["Direct JSON parsing failed", "JSON extraction from text failed"]
        }));
    }

    #[tokio::test]
    async fn test_storage_failure_is_bad_request() {
        let generator = Arc::new(MockGenerator::replying("{}"));
        let server = server(MockFetcher::failing("AccessDenied"), generator.clone());

        let response = server
            .post("/invoice_process")
            .json(&json!({ "api_key": "k", "s3_bucket": "docs", "s3_key": "inv.pdf" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(
            body["error"],
            "Failed to download from S3: S3 SDK error: AccessDenied"
        );
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_input_is_bad_request() {
        let server = server(MockFetcher::default(), Arc::new(MockGenerator::replying("{}")));

        let response = server
            .post("/invoice_process")
            .json(&json!({ "api_key": "k" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Missing file input"));
    }

    #[tokio::test]
    async fn test_invalid_base64_is_bad_request() {
        let server = server(MockFetcher::default(), Arc::new(MockGenerator::replying("{}")));

        let response = server
            .post("/invoice_process")
            .json(&json!({ "api_key": "k", "file_content": "%%%" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid base64 for file_content"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_bad_request() {
        let server = server(pdf_fetcher(), Arc::new(MockGenerator::replying("{}")));

        let response = server
            .post("/invoice_process")
            .json(&json!({ "s3_bucket": "docs", "s3_key": "inv.pdf" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("api_key"));
    }

    #[tokio::test]
    async fn test_remote_failure_is_internal_error() {
        let server = server(
            pdf_fetcher(),
            Arc::new(MockGenerator::failing("API key not valid")),
        );

        let response = server
            .post("/invoice_process")
            .json(&json!({ "api_key": "bad", "s3_bucket": "docs", "s3_key": "inv.pdf" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(
            body["error"],
            "An internal server error occurred: Gemini API error: HTTP 400: API key not valid"
        );
    }
}
