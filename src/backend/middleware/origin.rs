/**
 * Origin Check
 *
 * Guards the WebSocket upgrade against cross-site pages. The rules, in
 * order:
 *
 * 1. No `Origin` header: allowed (non-browser clients)
 * 2. An unparsable origin: rejected
 * 3. `*` in the allow list: allowed
 * 4. Host name exactly `localhost`, `127.0.0.1`, `[::1]` or `*.localhost`
 *    (any port): allowed
 * 5. Empty allow list: allowed
 * 6. `*.example.com` matches any host ending in `.example.com`; any other
 *    entry must equal the origin's host (with port) or the full origin
 */

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::ORIGIN, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::backend::server::config::ServerConfig;

/// Host part (with port) of an origin such as `https://app.example.com:8443`
fn origin_host(origin: &str) -> Option<&str> {
    let (_, rest) = origin.split_once("://")?;
    let host = rest.split('/').next().unwrap_or(rest);
    (!host.is_empty()).then_some(host)
}

/// `host` without its port
fn host_name(host: &str) -> &str {
    match host.strip_prefix('[') {
        Some(rest) => rest.split(']').next().unwrap_or(rest),
        None => host.split(':').next().unwrap_or(host),
    }
}

fn is_loopback(host: &str) -> bool {
    let name = host_name(host);
    name == "localhost" || name == "127.0.0.1" || name == "::1" || name.ends_with(".localhost")
}

/// Whether a connection from `origin` may be upgraded
pub fn origin_allowed(origin: Option<&str>, allowed: &[String]) -> bool {
    let Some(origin) = origin else {
        return true;
    };
    let Some(host) = origin_host(origin.trim()) else {
        return false;
    };

    if allowed.iter().any(|entry| entry.trim() == "*") {
        return true;
    }
    if is_loopback(host) {
        return true;
    }
    if allowed.is_empty() {
        return true;
    }

    allowed.iter().map(|entry| entry.trim()).any(|entry| match entry.strip_prefix('*') {
        Some(suffix) if suffix.starts_with('.') => host.ends_with(suffix),
        _ => host == entry || origin.trim() == entry,
    })
}

/// Reject requests whose `Origin` is not allowed with 403
pub async fn origin_guard(
    State(config): State<Arc<ServerConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let origin = request.headers().get(ORIGIN).and_then(|h| h.to_str().ok());
    if !origin_allowed(origin, &config.allowed_origins) {
        tracing::warn!(origin = origin.unwrap_or_default(), "rejected connection from origin");
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(next.run(request).await)
}
