//! Beyond Wellness Storefront library.
//!
//! Server-rendered storefront over the Shopify Storefront API. Exposed as a
//! library so the router can be driven end to end in tests.
//!
//! # Architecture
//!
//! - [`shopify`] - Storefront API client (GraphQL documents, cache, conversions)
//! - [`variants`] - Selected variant resolution and canonical variant URLs
//! - [`loader`] - Critical/deferred data loading and streamed pages
//! - [`context`] - Per-request [`context::LoaderContext`]
//! - [`routes`] - Page and fragment handlers
//! - [`analytics`] - `product_viewed` / `cart_viewed` events

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod config;
pub mod context;
pub mod error;
pub mod filters;
pub mod loader;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod shopify;
pub mod state;
pub mod variants;

use axum::{Router, extract::Request, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

use state::AppState;

/// Static assets directory, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the storefront application with its full middleware stack.
///
/// See [`middleware`] for the layer order.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::csp_nonce_middleware))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
        .layer(sentry_tower::NewSentryLayer::new_from_top())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not call Shopify.
async fn health() -> &'static str {
    "ok"
}
