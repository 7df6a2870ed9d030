//! One log line per request: client, method, path, status, duration.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};

pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let duration_ms = (start.elapsed().as_secs_f64() * 100_000.0).round() / 100.0;
    tracing::info!(
        %client,
        %method,
        %path,
        status = response.status().as_u16(),
        duration_ms,
        "request"
    );
    response
}
