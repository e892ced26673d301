// src/web/mod.rs

//! The HTTP surface: routing, server startup and error-to-response mapping.

use crate::config::Config;
use crate::errors::Error;
use anyhow::Context;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

mod handlers;
pub mod stream;

// --- Shared State ---
pub(crate) struct AppState {
    pub(crate) config: Config,
}

// --- Server Startup ---

/// Builds the router serving both request shapes.
///
/// `GET` on any path is path-addressed, `POST` on any path is body-addressed,
/// and every other method is answered with `405`.
pub fn create_router(config: Config) -> Router {
    let state = Arc::new(AppState { config });

    Router::new()
        .route(
            "/",
            get(handlers::get_handler)
                .post(handlers::post_handler)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/*path",
            get(handlers::get_handler)
                .post(handlers::post_handler)
                .fallback(handlers::method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `config.bind_addr` and serves until Ctrl+C.
///
/// In-flight requests are allowed to finish on shutdown.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_addr;
    let app = create_router(config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    log::info!("repotar listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Ctrl+C received, shutting down..."),
        Err(e) => {
            log::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

// --- Error Responses ---

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        // Full detail goes to the log; the caller only sees the generic message.
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "{}", self);
        }

        let message = self.client_message();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            return (status, [(header::ALLOW, "GET, POST")], message).into_response();
        }
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8_lossy(&bytes).to_string()
    }

    #[tokio::test]
    async fn test_error_response_is_generic() {
        let error = Error::PathNotFound {
            path: "/tmp/repo-download-x/repo/widgets-main/docs".to_string(),
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Specified path does not exist");
    }

    #[tokio::test]
    async fn test_unsupported_method_is_405() {
        let temp = tempfile::tempdir().unwrap();
        let app = create_router(Config::new_for_test(temp.path()));

        for method in ["PUT", "DELETE", "PATCH"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri("/github.com/acme/widgets")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(response.headers()[header::ALLOW], "GET, POST");
            assert_eq!(body_text(response).await, "Method not allowed");
        }
    }

    #[tokio::test]
    async fn test_root_get_is_malformed() {
        let temp = tempfile::tempdir().unwrap();
        let app = create_router(Config::new_for_test(temp.path()));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Invalid URL format"));
    }
}
