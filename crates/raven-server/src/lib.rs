//! raven-server - REST API server for raven.
//!
//! Exposes the conversation pipeline, the fact and dialog logs and the
//! outreach job over HTTP.
//!
//! # Example
//!
//! ```ignore
//! use raven_server::{create_server, factory, AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = raven_core::RavenConfig::from_env();
//!     let conversation = factory::create_conversation(&config).unwrap();
//!     let app = create_server(AppState::new(conversation));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod factory;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use factory::{create_conversation, create_outreach};
pub use state::AppState;

use std::sync::Arc;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

/// Create the server with bearer authentication against `api_key`.
pub fn create_server_with_auth(state: AppState, api_key: impl Into<String>) -> Router {
    let api_key: Arc<str> = Arc::from(api_key.into());
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn_with_state(
            api_key,
            middleware::auth_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::routes::test_support::conversation;

    fn request(auth: Option<&str>) -> Request<Body> {
        let builder = Request::builder().uri("/state");
        match auth {
            Some(value) => builder.header("Authorization", value),
            None => builder,
        }
        .body(Body::empty())
        .unwrap()
    }

    #[tokio::test]
    async fn test_auth_rejects_missing_and_wrong_keys() {
        let app = create_server_with_auth(AppState::new(conversation(Some("ok"))), "secret");

        let response = app.clone().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.clone().oneshot(request(Some("Bearer nope"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(request(Some("Bearer secret"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_open_server_needs_no_key() {
        let app = create_server(AppState::new(conversation(Some("ok"))));
        let response = app.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
