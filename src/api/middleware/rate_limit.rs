//! Admission control middleware backed by [`AdmissionService`].
//!
//! [`AdmissionService`]: crate::application::services::AdmissionService

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::json;
use std::net::IpAddr;

use crate::application::services::LimiterPolicy;
use crate::domain::entities::Caller;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Client IP the admission check ran under, left in the request extensions for
/// handlers that record it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// Per-IP burst limit on short link resolution.
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/{code}", get(redirect_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit::redirect_guard));
/// ```
pub async fn redirect_guard(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&st, LimiterPolicy::Redirect, req, next).await
}

/// Per-tier allocation quota on short link creation.
///
/// Must run after [`identity::layer`](super::identity::layer), which supplies the
/// [`Caller`]. Accounts are limited by account id, anonymous callers by IP.
pub async fn allocation_guard(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&st, LimiterPolicy::Allocation, req, next).await
}

async fn guard(
    st: &AppState,
    policy: LimiterPolicy,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = req
        .extensions()
        .get::<Caller>()
        .copied()
        .unwrap_or_default();

    let ip = client_ip(&req, st.behind_proxy);
    req.extensions_mut().insert(ClientIp(ip));

    if !st.admission.admit(policy, &caller, ip) {
        let limit = match policy {
            LimiterPolicy::Redirect => "redirect",
            LimiterPolicy::Allocation => "allocation",
        };
        return Err(AppError::rate_limited(
            "Too many requests",
            json!({ "limit": limit, "tier": caller.tier() }),
        ));
    }

    Ok(next.run(req).await)
}
