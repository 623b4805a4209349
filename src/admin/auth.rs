use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use subtle::ConstantTimeEq;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::security::client_ip::resolve_client_ip;
use crate::security::{log_security_event, SecurityEvent};

/// Proof that the request carried the admin bearer token.
///
/// An empty configured key locks the admin API instead of opening it.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

pub fn token_matches(presented: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let config = state.config();

        match bearer_token(parts) {
            Some(token) if token_matches(token, &config.admin.api_key) => Ok(AdminAccess),
            Some(_) => {
                let client = resolve_client_ip(parts, config.security.trust_forwarded_headers);
                log_security_event(SecurityEvent::InvalidAdminToken, client.as_str(), parts.uri.path());
                Err(ApiError::Unauthorized)
            }
            None => Err(ApiError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches() {
        assert!(token_matches("s3cret", "s3cret"));
        assert!(!token_matches("s3cre", "s3cret"));
        assert!(!token_matches("", ""));
        assert!(!token_matches("anything", ""));
    }
}
