//! API route configuration.
//!
//! Every API route runs behind [`crate::api::middleware::identity`], so handlers
//! always find a [`Caller`](crate::domain::entities::Caller) in the request
//! extensions.

use crate::api::handlers::{
    delete_link_handler, get_link_handler, list_links_handler, shorten_handler, stats_handler,
    update_link_handler,
};
use crate::api::middleware::{identity, rate_limit};
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// All API routes.
///
/// # Endpoints
///
/// - `POST   /short`          - Create a short link (allocation quota applies)
/// - `GET    /short`          - List the caller's links (API key required)
/// - `GET    /short/{code}`   - Fetch one link (owner)
/// - `PUT    /short/{code}`   - Edit a link (premium owner)
/// - `DELETE /short/{code}`   - Delete a link (premium owner)
/// - `GET    /stats/{code}`   - Click statistics (premium owner)
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/short",
            post(shorten_handler)
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    rate_limit::allocation_guard,
                ))
                .get(list_links_handler),
        )
        .route(
            "/short/{code}",
            get(get_link_handler)
                .put(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/stats/{code}", get(stats_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            identity::layer,
        ))
}
