//! Inbound email webhook: replies from visitors land in their thread.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::WebhookConfig;
use crate::http::body::{check_declared_length, read_limited};
use crate::http::error::ApiError;
use crate::http::guards::enforce_rate_limit;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::like::contains_pattern;
use crate::security::sanitize::{clean_text, strip_header_injection};
use crate::security::signature::{self, SIGNATURE_HEADER, SVIX_SIGNATURE_HEADER};
use crate::security::validation::is_valid_email;
use crate::security::{log_security_event, ClientIp, SecurityEvent};
use crate::store::{ContactMessage, MessageStore, ReplyDirection};

pub const EMAIL_RECEIVED: &str = "email.received";
const MAX_REPLY_CHARS: usize = 50_000;

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Option<InboundEmail>,
}

#[derive(Debug, Deserialize)]
pub struct InboundEmail {
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WebhookAck {
    pub received: bool,
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignored: bool,
}

/// Bare address from `"Name <addr>"` or `addr`, lower-cased.
pub fn parse_sender(from: &str) -> Option<String> {
    let from = from.trim();
    let address = match (from.rfind('<'), from.rfind('>')) {
        (Some(start), Some(end)) if start < end => &from[start + 1..end],
        _ => from,
    };
    let address = address.trim().to_lowercase();
    is_valid_email(&address).then_some(address)
}

/// Strip any run of `Re:` / `Fw:` / `Fwd:` prefixes.
pub fn strip_reply_prefixes(subject: &str) -> &str {
    let mut rest = subject.trim();
    loop {
        let lower = rest.to_ascii_lowercase();
        let prefix_len = ["re:", "fwd:", "fw:"]
            .iter()
            .find(|p| lower.starts_with(*p))
            .map(|p| p.len());
        match prefix_len {
            Some(len) => rest = rest[len..].trim_start(),
            None => return rest,
        }
    }
}

/// Thread for an inbound email: same sender and a subject containing the
/// original, else that sender's most recent message.
pub fn match_thread(store: &MessageStore, sender: &str, subject: &str) -> Option<ContactMessage> {
    let core = strip_reply_prefixes(subject);
    if !core.is_empty() {
        if let Some(found) = store.find_thread(sender, &contains_pattern(core)) {
            return Some(found);
        }
    }
    store.latest_from(sender)
}

fn verify_signature(
    config: &WebhookConfig,
    headers: &HeaderMap,
    body: &[u8],
    client: &ClientIp,
) -> Result<(), ApiError> {
    let Some(secret) = config.secret.as_deref() else {
        if config.require_secret {
            log_security_event(SecurityEvent::UnsignedWebhook, client.as_str(), "no secret configured, rejecting");
            return Err(ApiError::InvalidSignature);
        }
        tracing::warn!(
            target: "security",
            client = %client,
            "Webhook secret not configured, accepting unsigned webhook"
        );
        return Ok(());
    };

    let header = headers
        .get(SIGNATURE_HEADER)
        .or_else(|| headers.get(SVIX_SIGNATURE_HEADER))
        .and_then(|v| v.to_str().ok());

    let result = match header {
        Some(header) => signature::verify(body, header, secret, config.tolerance_secs),
        None => Err(signature::SignatureError::Missing),
    };

    result.map_err(|e| {
        log_security_event(SecurityEvent::InvalidSignature, client.as_str(), &e.to_string());
        metrics::record_webhook_event("invalid_signature");
        ApiError::InvalidSignature
    })
}

/// `POST /api/webhooks/email-received`
pub async fn email_received(
    State(state): State<AppState>,
    client: ClientIp,
    request: Request<Body>,
) -> Result<Json<WebhookAck>, ApiError> {
    let config = state.config();
    let (parts, body) = request.into_parts();

    enforce_rate_limit(&state, &config, "webhook", &client, &config.webhook.rate_limit)?;

    check_declared_length(&parts.headers, config.webhook.max_body_bytes)?;
    let raw = read_limited(body, config.webhook.max_body_bytes).await?;

    verify_signature(&config.webhook, &parts.headers, &raw, &client)?;

    let event: WebhookEvent = serde_json::from_slice(&raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    if event.event_type != EMAIL_RECEIVED {
        tracing::debug!(event_type = %event.event_type, "Ignoring webhook event");
        metrics::record_webhook_event("ignored");
        return Ok(Json(WebhookAck {
            received: true,
            matched: false,
            reply_id: None,
            ignored: true,
        }));
    }

    let email = event
        .data
        .ok_or_else(|| ApiError::BadRequest("Missing email data".to_string()))?;
    let sender = parse_sender(&email.from)
        .ok_or_else(|| ApiError::BadRequest("Invalid sender address".to_string()))?;

    let Some(thread) = match_thread(&state.store, &sender, &email.subject) else {
        tracing::info!(sender = %sender, "Inbound email matched no contact thread");
        metrics::record_webhook_event("unmatched");
        return Ok(Json(WebhookAck {
            received: true,
            matched: false,
            reply_id: None,
            ignored: false,
        }));
    };

    let body_text = email.text.or(email.html).unwrap_or_default();
    let body_text: String = clean_text(&body_text).chars().take(MAX_REPLY_CHARS).collect();
    let subject = strip_header_injection(&email.subject);

    let reply = state
        .store
        .add_reply(thread.id, ReplyDirection::Inbound, sender.clone(), subject, body_text)?;
    state.store.flush().await?;

    tracing::info!(message_id = %thread.id, reply_id = %reply.id, sender = %sender, "Inbound reply stored");
    metrics::record_webhook_event("stored");

    Ok(Json(WebhookAck {
        received: true,
        matched: true,
        reply_id: Some(reply.id),
        ignored: false,
    }))
}
