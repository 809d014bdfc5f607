//! DTOs for owner link management.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::shorten::LinkResponse;
use crate::domain::entities::{RedirectKind, UrlPatch};

/// Request body for `PUT /api/short/{code}`.
///
/// All fields are optional; only provided fields are changed.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    /// New destination URL.
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: Option<String>,

    /// New short code.
    #[validate(length(min = 4, max = 8, message = "Code must be 4-8 characters"))]
    pub code: Option<String>,

    pub redirect: Option<RedirectKind>,
}

impl From<UpdateLinkRequest> for UrlPatch {
    fn from(req: UpdateLinkRequest) -> Self {
        UrlPatch {
            long_url: req.url,
            code: req.code,
            kind: req.redirect,
        }
    }
}

/// Response of `GET /api/short`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkListResponse {
    pub total: usize,
    pub items: Vec<LinkResponse>,
}
