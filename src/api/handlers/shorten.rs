//! Handler for the link shortening endpoint.

use axum::{Extension, Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::shorten::{LinkResponse, ShortenRequest};
use crate::domain::entities::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link, or returns the caller's equivalent existing one.
///
/// # Endpoint
///
/// `POST /api/short`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/a", "custom_code": "launch" }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "code": "launch",
///   "short_url": "https://s.example.com/launch",
///   "long_url": "https://example.com/a",
///   "redirect": "temporary",
///   "one_shot": false,
///   "created_at": "2025-03-01T08:00:00Z",
///   "expires_at": "2025-03-08T08:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - 400 on invalid URL or custom code
/// - 409 if the custom code is taken
/// - 429 if the allocation quota is exhausted
/// - 503 if no unique code could be allocated
pub async fn shorten_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let record = state
        .link_service
        .allocate(payload.into_allocation(caller))
        .await?;

    let short_url = state.short_url(&record.code);

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse::from_record(record, short_url)),
    ))
}
