//! Request extractors whose rejections render as [`AppError`].

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` with `{"detail": "..."}` rejections.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
