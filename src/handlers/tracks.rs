//! GET /tracks: list all labs visible to the configured team.

use std::sync::Arc;

use axum::{extract::Extension, Json};

use crate::catalog::LabDirectory;
use crate::error::AppError;
use crate::types::Lab;

pub async fn list_tracks(
    Extension(directory): Extension<Arc<dyn LabDirectory>>,
) -> Result<Json<Vec<Lab>>, AppError> {
    let labs = directory.list_labs().await.map_err(AppError::ListFailed)?;
    Ok(Json(labs))
}
