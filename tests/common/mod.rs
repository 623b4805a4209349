//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use contact_gateway::config::GatewayConfig;
use contact_gateway::mail::{Mailer, MemoryMailTransport};
use contact_gateway::security::signature;
use contact_gateway::store::MessageStore;
use contact_gateway::{AppState, HttpServer};

pub const ORIGIN: &str = "https://example.com";
pub const ADMIN_KEY: &str = "test-admin-key";
pub const WEBHOOK_SECRET: &str = "whsec_test";

pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.security.allowed_origins = vec![ORIGIN.to_string()];
    config.admin.api_key = ADMIN_KEY.to_string();
    config.webhook.secret = Some(WEBHOOK_SECRET.to_string());
    config
}

/// Gateway wired to an in-memory store and mailbox.
pub struct TestGateway {
    pub router: Router,
    pub state: AppState,
    pub mailbox: Arc<MemoryMailTransport>,
}

impl TestGateway {
    pub fn new(config: GatewayConfig) -> Self {
        let mailbox = Arc::new(MemoryMailTransport::new());
        let state = AppState::new(config, MessageStore::new(None), Mailer::new(mailbox.clone()));
        let router = HttpServer::new(state.clone()).router();
        Self {
            router,
            state,
            mailbox,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn contact_body() -> Value {
    serde_json::json!({
        "name": "Ada Lovelace",
        "email": "Ada@Example.com",
        "subject": "Project inquiry",
        "message": "We would like to discuss a new website."
    })
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::ORIGIN, ORIGIN)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_KEY))
        .body(Body::empty())
        .unwrap()
}

pub fn signed_webhook(body: &Value) -> Request<Body> {
    let raw = body.to_string();
    let ts = chrono::Utc::now().timestamp();
    Request::post("/api/webhooks/email-received")
        .header(header::CONTENT_TYPE, "application/json")
        .header(signature::SIGNATURE_HEADER, signature::sign(raw.as_bytes(), WEBHOOK_SECRET, ts))
        .body(Body::from(raw))
        .unwrap()
}

pub fn inbound_email(from: &str, subject: &str, text: &str) -> Value {
    serde_json::json!({
        "type": "email.received",
        "data": { "from": from, "subject": subject, "text": text }
    })
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
