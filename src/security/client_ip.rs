//! Client address resolution for rate-limit keys and audit logs.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{request::Parts, HeaderMap};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use crate::http::server::AppState;

/// Best-effort client IP. `"unknown"` when nothing identifies the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientIp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// First parseable address from `X-Forwarded-For`, then `X-Real-IP`.
pub fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_xff = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok());

    from_xff.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
    })
}

/// Resolve the client address. Forwarded headers are honored only when
/// the deployment says a trusted proxy sets them.
pub fn resolve_client_ip(parts: &Parts, trust_forwarded: bool) -> ClientIp {
    if trust_forwarded {
        if let Some(ip) = forwarded_ip(&parts.headers) {
            return ClientIp(ip.to_string());
        }
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| ClientIp(addr.ip().to_string()))
        .unwrap_or_else(|| ClientIp("unknown".to_string()))
}

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let trust = state.config().security.trust_forwarded_headers;
        Ok(resolve_client_ip(parts, trust))
    }
}
