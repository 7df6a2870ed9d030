//! POST /resolve: turn a natural-language prompt into an invite link.

use std::sync::Arc;

use axum::{extract::Extension, Json};

use crate::catalog::InviteIssuer;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::resolver::PromptResolver;
use crate::types::{Invite, PromptRequest};

pub async fn resolve(
    Extension(resolver): Extension<Arc<PromptResolver>>,
    Extension(issuer): Extension<Arc<dyn InviteIssuer>>,
    AppJson(req): AppJson<PromptRequest>,
) -> Result<Json<Invite>, AppError> {
    let resolution = resolver
        .resolve(&req.prompt)
        .await?
        .ok_or(AppError::NoMatch)?;

    tracing::info!(
        slug = %resolution.slug,
        stage = %resolution.stage,
        "resolved prompt"
    );

    let invite_url = issuer
        .create_invite(&resolution.slug)
        .await
        .map_err(AppError::InviteFailed)?;

    Ok(Json(Invite {
        slug: resolution.slug,
        invite_url,
    }))
}
