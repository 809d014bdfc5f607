//! Handler for per-link click statistics.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use super::links::require_account;
use crate::api::dto::stats::{DEFAULT_STATS_LIMIT, StatsQuery, StatsResponse};
use crate::domain::entities::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the click total and the most recent clicks of a link.
///
/// # Endpoint
///
/// `GET /api/stats/{code}?limit=N`
///
/// Clicks are written asynchronously, so a redirect may take a moment to show up.
///
/// # Errors
///
/// - 400 if `limit` is out of range
/// - 401 for anonymous callers
/// - 403 unless the caller is the link's premium owner
/// - 404 if the link does not exist
pub async fn stats_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(code): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    require_account(&caller)?;
    query.validate()?;

    let record = state.link_service.owned_record(&code, &caller).await?;
    let stats = state
        .stats_service
        .for_link(&record, query.limit.unwrap_or(DEFAULT_STATS_LIMIT))
        .await?;

    Ok(Json(StatsResponse {
        code: record.code,
        long_url: record.long_url,
        created_at: record.created_at,
        total: stats.total,
        items: stats.items.into_iter().map(Into::into).collect(),
    }))
}
