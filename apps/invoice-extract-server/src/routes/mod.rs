//! HTTP surface of the invoice extraction server

pub mod health;
pub mod invoice;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router with CORS, tracing and the body limit applied
pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.config().server.max_body_bytes;

    Router::new()
        .merge(health::router())
        .merge(invoice::router())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Any origin, no credentials
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-amz-date"),
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("x-amz-security-token"),
        ])
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::gemini::MockGenerator;
    use crate::storage::MockFetcher;

    fn app() -> Router {
        router(test_support::state(
            MockFetcher::default(),
            Arc::new(MockGenerator::replying("{}")),
        ))
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/invoice_process")
                    .header(header::ORIGIN, "https://review.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,x-api-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());

        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
            assert!(methods.contains(method), "missing {}", method);
        }
        let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed.contains("x-api-key"));
        assert!(allowed.contains("x-amz-security-token"));
    }

    #[tokio::test]
    async fn test_body_limit_is_enforced() {
        let mut config = crate::config::Config::default();
        config.server.max_body_bytes = 64;
        let state = test_support::state_with_config(
            config,
            MockFetcher::default(),
            Arc::new(MockGenerator::replying("{}")),
        );

        let body = format!(r#"{{"api_key": "k", "file_content": "{}"}}"#, "A".repeat(256));
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/invoice_process")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
