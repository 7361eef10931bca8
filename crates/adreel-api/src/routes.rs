//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::health::{health, ready};
use crate::handlers::lead::request_file_handler;
use crate::handlers::preview::generate_preview_handler;
use crate::handlers::render::render_and_upload_handler;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    // Public routes are rate-limited per IP; the internal route is
    // gated by the shared secret instead
    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .route("/generatePreview", post(generate_preview_handler))
        .route("/requestFile", post(request_file_handler))
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let internal_routes =
        Router::new().route("/internal/renderAndUpload", post(render_and_upload_handler));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    Router::new()
        .nest("/api", api_routes)
        .merge(internal_routes)
        .merge(health_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::ApiConfig;
    use crate::pipeline::deps::{
        MockContentGen, MockJobSink, MockObjectStore, MockPublisher, MockRecordStore, MockRenderer,
    };

    fn test_state() -> AppState {
        AppState {
            config: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                rate_limit_rps: 100,
                max_body_size: 1024 * 1024,
                internal_token: "secret".to_string(),
                default_qr_destination: "https://adreel.example.com".to_string(),
                sweep_interval: Duration::from_secs(300),
                sweep_stale_after: Duration::from_secs(900),
                environment: "development".to_string(),
            },
            records: Arc::new(MockRecordStore::new()),
            blobs: Arc::new(MockObjectStore::new()),
            content: Arc::new(MockContentGen::new()),
            publisher: Arc::new(MockPublisher::new()),
            queue: Arc::new(MockJobSink::new()),
            renderer: Arc::new(MockRenderer::new()),
        }
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn internal_route_rejects_without_secret() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/internal/renderAndUpload")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"previewId": "pv-1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn preview_with_empty_body_is_bad_request() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/generatePreview")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn security_headers_applied() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("X-Content-Type-Options").unwrap(),
            "nosniff"
        );
        assert!(response.headers().contains_key("X-Request-ID"));
    }
}
