//! Request metadata extraction.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Pick the referrer out of body and headers
//! - Determine the client IP behind proxies
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A referrer in the body wins over headers: the browser sends the
//!   landing page itself as `Referer`, the page script sends the real one

use axum::http::{HeaderMap, HeaderValue, Request};
use std::net::SocketAddr;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The request's ID as set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    header_str(headers, X_REQUEST_ID).unwrap_or("unknown")
}

/// Referrer precedence: body field, then `Referer`, then `Referrer`.
pub fn referrer(body_referrer: Option<&str>, headers: &HeaderMap) -> Option<String> {
    body_referrer
        .filter(|r| !r.is_empty())
        .or_else(|| header_str(headers, "referer"))
        .or_else(|| header_str(headers, "referrer"))
        .map(str::to_string)
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "user-agent").map(str::to_string)
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}
