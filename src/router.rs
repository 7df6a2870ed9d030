//! Router construction for the lab router.

use std::any::Any;
use std::sync::Arc;

use axum::{
    middleware as axum_mw,
    response::Response,
    routing::{get, post},
    Extension, Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::catalog::{InviteIssuer, LabDirectory};
use crate::error::internal_error_response;
use crate::handlers;
use crate::middleware::auth::{api_key_auth, ApiKey};
use crate::middleware::request_log::log_requests;
use crate::resolver::PromptResolver;

/// Collaborators shared by every request.
#[derive(Clone)]
pub struct Services {
    pub directory: Arc<dyn LabDirectory>,
    pub issuer: Arc<dyn InviteIssuer>,
    pub resolver: Arc<PromptResolver>,
}

/// Build the full axum router with all routes and middleware.
pub fn build_router(services: Services, api_key: ApiKey) -> Router {
    // Routes that require the shared secret
    let protected = Router::new()
        .route("/tracks", get(handlers::tracks::list_tracks))
        .route("/invite", post(handlers::invite::create_invite))
        .route("/resolve", post(handlers::resolve::resolve))
        .layer(axum_mw::from_fn(api_key_auth))
        .layer(Extension(api_key));

    // Public routes (no auth)
    let public = Router::new().route("/health", get(handlers::health::health));

    public
        .merge(protected)
        .layer(Extension(services.directory))
        .layer(Extension(services.issuer))
        .layer(Extension(services.resolver))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum_mw::from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(%detail, "handler panicked");
    internal_error_response("Panic", &detail)
}
