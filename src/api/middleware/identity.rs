//! Bearer token caller identification.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::domain::entities::Caller;
use crate::{error::AppError, state::AppState};

/// Identifies the caller and stores a [`Caller`] in the request extensions.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <api key>
/// ```
///
/// Requests without an `Authorization` header proceed as anonymous callers.
///
/// # Errors
///
/// Returns `401 Unauthorized` if the header is present but malformed, or the key
/// is unknown.
///
/// # Example
///
/// ```rust,ignore
/// let api = Router::new()
///     .route("/short", post(shorten_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), identity::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let caller = if parts.headers.contains_key(header::AUTHORIZATION) {
        let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
            .await
            .map_err(|_| {
                AppError::unauthorized(
                    "Unauthorized",
                    serde_json::json!({"reason": "Authorization header is invalid"}),
                )
            })?;

        st.auth_service.identify(&token)?
    } else {
        Caller::anonymous()
    };

    parts.extensions.insert(caller);
    let req = Request::from_parts(parts, body);

    Ok(next.run(req).await)
}
