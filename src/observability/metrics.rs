//! Metrics collection and exposition.
//!
//! # Metrics
//! - `contact_submissions_total` (counter): by outcome
//! - `newsletter_signups_total` (counter): by outcome
//! - `webhook_events_total` (counter): by outcome
//! - `emails_sent_total` (counter): by kind, outcome
//! - `rate_limited_total` (counter): by route
//! - `security_events_total` (counter): by kind
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! deployments without Prometheus pay nothing.

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_contact_submission(outcome: &'static str) {
    counter!("contact_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_newsletter_signup(outcome: &'static str) {
    counter!("newsletter_signups_total", "outcome" => outcome).increment(1);
}

pub fn record_webhook_event(outcome: &'static str) {
    counter!("webhook_events_total", "outcome" => outcome).increment(1);
}

pub fn record_email(kind: &'static str, outcome: &'static str) {
    counter!("emails_sent_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_rate_limited(route: &str) {
    counter!("rate_limited_total", "route" => route.to_string()).increment(1);
}

pub fn record_security_event(kind: &'static str) {
    counter!("security_events_total", "kind" => kind).increment(1);
}
