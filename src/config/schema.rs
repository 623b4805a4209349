//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the contact gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Origin checks, headers and global body cap.
    pub security: SecurityConfig,

    /// Rate limiter housekeeping.
    pub rate_limit: RateLimitConfig,

    /// Public contact form.
    pub contact: ContactConfig,

    /// Newsletter sign-up.
    pub newsletter: NewsletterConfig,

    /// Inbound email webhook.
    pub webhook: WebhookConfig,

    /// Outbound email.
    pub mail: MailConfig,

    /// Admin API access.
    pub admin: AdminConfig,

    /// Record persistence.
    pub store: StoreConfig,

    /// News feed content.
    pub news: NewsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum requests processed concurrently (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 1_024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for a request/response in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,

    /// Hard cap on any request body, in bytes.
    pub max_body_size: usize,

    /// Origins allowed to submit public forms (e.g. "https://example.com").
    pub allowed_origins: Vec<String>,

    /// Reject form posts that carry neither Origin nor Referer.
    pub require_origin: bool,

    /// Take the client IP from X-Forwarded-For / X-Real-IP.
    /// Only enable behind a proxy that overwrites these headers.
    pub trust_forwarded_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 1024 * 1024, // 1MB
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            require_origin: true,
            trust_forwarded_headers: false,
        }
    }
}

/// A fixed-window limit: `max_requests` per `window_ms`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct RateLimitRule {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl RateLimitRule {
    pub const fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Rate limiter housekeeping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting on public routes.
    pub enabled: bool,

    /// How often expired windows are evicted, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_secs: 60,
        }
    }
}

/// Contact form configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Maximum accepted body in bytes.
    pub max_body_bytes: usize,

    /// Per-IP limit.
    pub rate_limit: RateLimitRule,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 100 * 1024,
            rate_limit: RateLimitRule::new(5, 60_000),
        }
    }
}

/// Newsletter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NewsletterConfig {
    pub max_body_bytes: usize,
    pub rate_limit: RateLimitRule,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 4 * 1024,
            rate_limit: RateLimitRule::new(3, 60_000),
        }
    }
}

/// Inbound email webhook configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared signing secret. Unset means signatures are not checked.
    pub secret: Option<String>,

    /// Reject every webhook while no secret is configured.
    pub require_secret: bool,

    /// Accepted clock skew for the signed timestamp, in seconds.
    pub tolerance_secs: u64,

    pub max_body_bytes: usize,

    pub rate_limit: RateLimitRule,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            require_secret: false,
            tolerance_secs: 300,
            max_body_bytes: 512 * 1024,
            rate_limit: RateLimitRule::new(60, 60_000),
        }
    }
}

/// Outbound email configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailConfig {
    /// Send through the HTTP provider. When false, emails are only logged.
    pub enabled: bool,

    /// Provider endpoint accepting `POST` of a JSON email.
    pub api_url: String,

    /// Provider API key (Bearer).
    pub api_key: String,

    /// Sender, e.g. "Acme <hello@acme.example>".
    pub from: String,

    /// Inbox receiving new-message notifications.
    pub notify_to: String,

    /// Company name used in templates.
    pub company_name: String,

    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: String::new(),
            from: "Website <noreply@localhost>".to_string(),
            notify_to: "inbox@localhost".to_string(),
            company_name: "Our team".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token for admin routes. Empty disables admin access entirely.
    pub api_key: String,
}

/// Record persistence.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot file. Records are memory-only when unset.
    pub snapshot_path: Option<String>,
}

/// A news entry served by `/api/news`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub published: Option<String>,
}

/// Keyword rule assigning a category to news items.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NewsCategory {
    pub name: String,
    pub keywords: Vec<String>,
}

/// News feed content.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NewsConfig {
    pub items: Vec<NewsItem>,
    pub categories: Vec<NewsCategory>,
    /// Category for items no keyword matches.
    pub default_category: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        let item = |title: &str, link: &str, summary: &str| NewsItem {
            title: title.to_string(),
            link: link.to_string(),
            source: "Company".to_string(),
            summary: summary.to_string(),
            published: None,
        };
        let category = |name: &str, keywords: &[&str]| NewsCategory {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };

        Self {
            items: vec![
                item(
                    "Cloud security checklist for growing teams",
                    "https://example.com/news/cloud-security",
                    "Practical steps to harden infrastructure and access control.",
                ),
                item(
                    "How AI assistants are changing customer support",
                    "https://example.com/news/ai-support",
                    "Machine learning models now triage most first-line tickets.",
                ),
                item(
                    "Migrating legacy systems without downtime",
                    "https://example.com/news/migration",
                    "A phased approach to infrastructure modernization.",
                ),
            ],
            categories: vec![
                category("Security", &["security", "breach", "vulnerability", "encryption", "privacy"]),
                category("AI", &["ai", "machine learning", "llm", "model", "neural"]),
                category("Cloud", &["cloud", "kubernetes", "serverless", "infrastructure"]),
            ],
            default_category: "Technology".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter used when RUST_LOG is unset.
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "contact_gateway=info,tower_http=info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
