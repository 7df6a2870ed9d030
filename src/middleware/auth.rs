//! Shared-secret bearer check for the business routes.

use std::sync::Arc;

use axum::{
    extract::{Extension, Request},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;

/// The secret callers must present as `Authorization: Bearer <key>`.
#[derive(Clone)]
pub struct ApiKey {
    expected_header: Arc<str>,
}

impl ApiKey {
    pub fn new(key: &str) -> Self {
        Self {
            expected_header: Arc::from(format!("Bearer {}", key)),
        }
    }

    /// Exact match only. Scheme case, extra whitespace and a missing header
    /// are all rejected the same way.
    pub fn accepts(&self, header: Option<&str>) -> bool {
        header == Some(&*self.expected_header)
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(..)")
    }
}

pub async fn api_key_auth(
    Extension(key): Extension<ApiKey>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if !key.accepts(header) {
        tracing::debug!(
            header_present = header.is_some(),
            path = %req.uri().path(),
            "rejected request with bad API key"
        );
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(req).await)
}
