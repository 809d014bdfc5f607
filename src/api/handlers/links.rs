//! Handlers for owner link management (list, update, delete).

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::link::{LinkListResponse, UpdateLinkRequest};
use crate::api::dto::shorten::LinkResponse;
use crate::domain::entities::Caller;
use crate::error::AppError;
use crate::state::AppState;

pub(crate) fn require_account(caller: &Caller) -> Result<(), AppError> {
    if caller.is_anonymous() {
        return Err(AppError::unauthorized(
            "Unauthorized",
            json!({"reason": "An API key is required"}),
        ));
    }
    Ok(())
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/short`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<LinkListResponse>, AppError> {
    require_account(&caller)?;

    let items: Vec<LinkResponse> = state
        .link_service
        .list(&caller)
        .await?
        .into_iter()
        .map(|record| {
            let short_url = state.short_url(&record.code);
            LinkResponse::from_record(record, short_url)
        })
        .collect();

    Ok(Json(LinkListResponse {
        total: items.len(),
        items,
    }))
}

/// Returns one of the caller's links.
///
/// # Endpoint
///
/// `GET /api/short/{code}`
///
/// # Errors
///
/// - 401 for anonymous callers
/// - 403 unless the caller owns the link
/// - 404 if the link does not exist
pub async fn get_link_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(code): Path<String>,
) -> Result<Json<LinkResponse>, AppError> {
    require_account(&caller)?;

    let record = state.link_service.get(&code, &caller).await?;

    let short_url = state.short_url(&record.code);
    Ok(Json(LinkResponse::from_record(record, short_url)))
}

/// Updates target, code or redirect kind of a link.
///
/// # Endpoint
///
/// `PUT /api/short/{code}`
///
/// # Errors
///
/// - 401 for anonymous callers
/// - 403 unless the caller is the link's premium owner
/// - 404 if the link does not exist
/// - 409 if the new code is taken
pub async fn update_link_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(code): Path<String>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    require_account(&caller)?;
    payload.validate()?;

    let record = state
        .link_service
        .edit(&code, &caller, payload.into())
        .await?;

    let short_url = state.short_url(&record.code);
    Ok(Json(LinkResponse::from_record(record, short_url)))
}

/// Deletes a link.
///
/// # Endpoint
///
/// `DELETE /api/short/{code}`
///
/// Returns `204 No Content` on success.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    require_account(&caller)?;

    state.link_service.delete(&code, &caller).await?;

    Ok(StatusCode::NO_CONTENT)
}
