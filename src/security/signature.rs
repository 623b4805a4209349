//! Webhook signature verification.
//!
//! Senders sign `"<timestamp>.<raw body>"` with HMAC-SHA256 and send
//! `t=<timestamp>,v1=<hex>` (the `v1=` prefix is optional). Several
//! signatures may follow the timestamp while a secret is being rotated;
//! one match is enough.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "webhook-signature";
/// Header name used by Svix-based providers.
pub const SVIX_SIGNATURE_HEADER: &str = "svix-signature";

/// Why a signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header is missing")]
    Missing,
    #[error("signature header is malformed")]
    Malformed,
    #[error("signature timestamp is outside the accepted window")]
    Expired,
    #[error("signature does not match")]
    Mismatch,
}

/// Parsed `t=<ts>,<sig>...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut parts = header.split(',').map(str::trim);

        let timestamp = parts
            .next()
            .and_then(|p| p.strip_prefix("t="))
            .and_then(|t| t.parse::<i64>().ok())
            .ok_or(SignatureError::Malformed)?;

        let signatures = parts
            .filter(|p| !p.is_empty())
            .map(|p| {
                let hex_sig = p.strip_prefix("v1=").unwrap_or(p);
                hex::decode(hex_sig).map_err(|_| SignatureError::Malformed)
            })
            .collect::<Result<Vec<_>, _>>()?;

        if signatures.is_empty() {
            return Err(SignatureError::Malformed);
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

fn mac_for(secret: &str, timestamp: i64, body: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac
}

/// Produce a header value for `body`. Used by senders and tests.
pub fn sign(body: &[u8], secret: &str, timestamp: i64) -> String {
    let digest = mac_for(secret, timestamp, body).finalize().into_bytes();
    format!("t={},v1={}", timestamp, hex::encode(digest))
}

/// Verify `header` over `body` at time `now` (unix seconds).
pub fn verify_at(
    body: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: u64,
) -> Result<(), SignatureError> {
    let parsed = SignatureHeader::parse(header)?;

    let skew = now.abs_diff(parsed.timestamp);
    if skew > tolerance_secs {
        return Err(SignatureError::Expired);
    }

    let expected = mac_for(secret, parsed.timestamp, body).finalize().into_bytes();
    let matched = parsed
        .signatures
        .iter()
        .fold(subtle::Choice::from(0u8), |acc, sig| acc | expected.as_slice().ct_eq(sig));

    if bool::from(matched) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Verify against the current clock.
pub fn verify(body: &[u8], header: &str, secret: &str, tolerance_secs: u64) -> Result<(), SignatureError> {
    verify_at(body, header, secret, chrono::Utc::now().timestamp(), tolerance_secs)
}
