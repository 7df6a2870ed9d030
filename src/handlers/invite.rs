//! POST /invite: create a fresh invite link for a known slug.
//!
//! The slug may come from the query string (`?slug=`) or a JSON body; the
//! query string wins when both carry a non-blank slug.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    Json,
};

use crate::catalog::InviteIssuer;
use crate::error::AppError;
use crate::types::{Invite, InviteParams};

pub async fn create_invite(
    Extension(issuer): Extension<Arc<dyn InviteIssuer>>,
    Query(query): Query<InviteParams>,
    body: Option<Json<InviteParams>>,
) -> Result<Json<Invite>, AppError> {
    let not_blank = |s: &String| !s.trim().is_empty();
    let slug = query
        .slug
        .filter(not_blank)
        .or_else(|| body.and_then(|Json(b)| b.slug).filter(not_blank))
        .ok_or_else(|| AppError::BadRequest("Missing required parameter: slug".into()))?;

    let invite_url = issuer
        .create_invite(&slug)
        .await
        .map_err(AppError::InviteFailed)?;

    Ok(Json(Invite { slug, invite_url }))
}
