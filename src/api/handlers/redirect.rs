//! Handler for short URL redirect.

use axum::{
    Extension,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
};
use tracing::warn;

use crate::api::middleware::rate_limit::ClientIp;
use crate::domain::entities::{NewClick, RedirectKind};
use crate::domain::errors::CoreError;
use crate::error::AppError;
use crate::state::AppState;

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Redirects a short code to its target URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Responses
///
/// - **307** for temporary links, **308** for permanent ones
/// - **404** if the code is unknown or a one-shot link was already used
/// - **410** if the link has expired; the record is purged
/// - **429** if the client exceeded the redirect burst limit
///
/// One-shot redirects carry `Cache-Control: no-store` so that browsers do not
/// replay them without asking.
///
/// Every successful redirect of a lasting link queues a click with the client
/// IP, `User-Agent` and `Referer`. One-shot links are gone after their redirect
/// and record nothing.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    client_ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let resolution = match state.link_service.resolve(&code).await {
        Ok(resolution) => resolution,
        Err(CoreError::Expired) => {
            if let Err(e) = state.link_service.purge_expired(&code).await {
                warn!(code = %code, error = %e, "Failed to purge expired link");
            }
            return Err(CoreError::Expired.into());
        }
        Err(e) => return Err(e.into()),
    };

    if !resolution.one_shot {
        state.stats_service.record(NewClick {
            url_id: resolution.url_id,
            ip: client_ip.map(|Extension(ClientIp(ip))| ip.to_string()),
            user_agent: header_text(&headers, header::USER_AGENT),
            referrer: header_text(&headers, header::REFERER),
            accessed_at: resolution.resolved_at,
        });
    }

    let redirect = match resolution.kind {
        RedirectKind::Temporary => Redirect::temporary(&resolution.target),
        RedirectKind::Permanent => Redirect::permanent(&resolution.target),
    };

    let mut response = redirect.into_response();
    if resolution.one_shot {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    Ok(response)
}
