//! Checks shared by the public form endpoints.

use axum::http::HeaderMap;

use crate::config::{GatewayConfig, RateLimitRule};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::security::{log_security_event, ClientIp, OriginCheck, OriginVerifier, SecurityEvent};

/// Reject cross-site submissions.
pub fn enforce_origin(config: &GatewayConfig, headers: &HeaderMap, client: &ClientIp) -> Result<(), ApiError> {
    let verifier = OriginVerifier::new(&config.security.allowed_origins, config.security.require_origin);

    match verifier.check(headers) {
        OriginCheck::Allowed | OriginCheck::Absent => Ok(()),
        OriginCheck::Missing => {
            log_security_event(SecurityEvent::OriginMissing, client.as_str(), "no Origin or Referer");
            Err(ApiError::OriginBlocked)
        }
        OriginCheck::Blocked(origin) => {
            log_security_event(SecurityEvent::OriginBlocked, client.as_str(), &origin);
            Err(ApiError::OriginBlocked)
        }
    }
}

/// Count the request against `route` for this client.
pub fn enforce_rate_limit(
    state: &AppState,
    config: &GatewayConfig,
    route: &str,
    client: &ClientIp,
    rule: &RateLimitRule,
) -> Result<(), ApiError> {
    if !config.rate_limit.enabled {
        return Ok(());
    }
    state.limiter.enforce(route, client.as_str(), rule).map(|_| ())
}
