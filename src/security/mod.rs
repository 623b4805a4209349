//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Public form post:
//!     → origin.rs (Origin/Referer allow-list)
//!     → rate_limit.rs (per route + client IP window)
//!     → validation.rs (lengths, character classes, markup/SQL fragments)
//!     → sanitize.rs (HTML escaping, mail header CRLF stripping)
//!
//! Inbound webhook:
//!     → rate_limit.rs
//!     → signature.rs (HMAC-SHA256 over timestamp + raw body)
//!     → like.rs (escape subject before thread lookup)
//! ```
//!
//! # Design Decisions
//! - Checks run before anything is persisted or mailed
//! - Rejections are logged on the `security` target

pub mod client_ip;
pub mod like;
pub mod origin;
pub mod rate_limit;
pub mod sanitize;
pub mod signature;
pub mod validation;

pub use client_ip::ClientIp;
pub use origin::{OriginCheck, OriginVerifier};
pub use rate_limit::{RateLimitDecision, RateLimiter};

use crate::observability::metrics;

/// Kinds of security-relevant rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    OriginBlocked,
    OriginMissing,
    InvalidSignature,
    UnsignedWebhook,
    InvalidAdminToken,
    SuspiciousInput,
}

impl SecurityEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEvent::OriginBlocked => "origin_blocked",
            SecurityEvent::OriginMissing => "origin_missing",
            SecurityEvent::InvalidSignature => "invalid_signature",
            SecurityEvent::UnsignedWebhook => "unsigned_webhook",
            SecurityEvent::InvalidAdminToken => "invalid_admin_token",
            SecurityEvent::SuspiciousInput => "suspicious_input",
        }
    }
}

/// Emit a structured security log line and bump its counter.
pub fn log_security_event(event: SecurityEvent, client: &str, detail: &str) {
    tracing::warn!(
        target: "security",
        kind = event.as_str(),
        client = %client,
        detail = %detail,
        "Security event"
    );
    metrics::record_security_event(event.as_str());
}
