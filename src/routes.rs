//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`      - Short link redirect (public, burst limited)
//! - `GET  /health`      - Health check: store and limiters (public)
//! - `/api/*`            - REST API (anonymous or Bearer API key)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Admission** - Redirect burst limit and allocation quota
//! - **Identity** - Optional Bearer API key
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// Client IPs for rate limiting come from the socket peer unless
/// [`AppState::behind_proxy`] is set.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// The routes of [`app_router`] without path normalization.
pub fn router(state: AppState) -> Router {
    let api_router = api::routes::api_routes(&state);

    let redirect = get(redirect_handler).route_layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limit::redirect_guard,
    ));

    Router::new()
        .route("/{code}", redirect)
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer())
}
