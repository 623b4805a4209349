//! Public contact form endpoint.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::body::read_json;
use crate::http::error::ApiError;
use crate::http::guards::{enforce_origin, enforce_rate_limit};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::validation::{limits, FieldError, Validator, DISALLOWED_CONTENT};
use crate::security::{log_security_event, ClientIp, SecurityEvent};
use crate::store::NewContactMessage;

/// JSON body of `POST /api/contact`. Missing strings default to empty so
/// validation can report them per field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: String,
    pub message: String,
}

impl ContactSubmission {
    /// Clean and check every field.
    pub fn validate(&self, ip: Option<String>) -> Result<NewContactMessage, Vec<FieldError>> {
        let mut v = Validator::new();

        let name = v.name("name", &self.name);
        let email = v.email("email", &self.email);
        let phone = v.phone("phone", self.phone.as_deref());
        let company = v.optional_text("company", self.company.as_deref(), limits::COMPANY_MAX);
        let subject = v.text("subject", &self.subject, limits::SUBJECT_MIN, limits::SUBJECT_MAX);
        let message = v.text("message", &self.message, limits::MESSAGE_MIN, limits::MESSAGE_MAX);

        v.finish()?;

        Ok(NewContactMessage {
            name,
            email,
            phone,
            company,
            subject,
            message,
            ip,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactCreated {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
}

/// `POST /api/contact`
pub async fn submit_contact(
    State(state): State<AppState>,
    client: ClientIp,
    request: Request<Body>,
) -> Result<(StatusCode, Json<ContactCreated>), ApiError> {
    let config = state.config();
    let (parts, body) = request.into_parts();

    enforce_origin(&config, &parts.headers, &client).inspect_err(|_| {
        metrics::record_contact_submission("origin_blocked");
    })?;
    enforce_rate_limit(&state, &config, "contact", &client, &config.contact.rate_limit)?;

    let submission: ContactSubmission =
        read_json(&parts.headers, body, config.contact.max_body_bytes).await?;

    let ip = (client.as_str() != "unknown").then(|| client.to_string());
    let new_message = submission.validate(ip).map_err(|errors| {
        tracing::info!(client = %client, fields = ?errors.iter().map(|e| e.field).collect::<Vec<_>>(), "Contact submission rejected");
        if let Some(e) = errors.iter().find(|e| e.message == DISALLOWED_CONTENT) {
            log_security_event(SecurityEvent::SuspiciousInput, client.as_str(), e.field);
        }
        metrics::record_contact_submission("invalid");
        ApiError::Validation(errors)
    })?;

    let message = state.store.insert_message(new_message);
    state.store.flush().await?;

    tracing::info!(id = %message.id, client = %client, "Contact message stored");
    metrics::record_contact_submission("accepted");

    let report = state.mailer.dispatch_contact(&config.mail, &message).await;
    if !report.notification_sent || !report.confirmation_sent {
        tracing::warn!(id = %message.id, ?report, "Contact emails partially failed");
    }

    Ok((
        StatusCode::CREATED,
        Json(ContactCreated {
            success: true,
            message: "Thank you for your message. We'll get back to you soon.".to_string(),
            id: message.id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ContactSubmission {
        ContactSubmission {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            phone: Some("+44 20 7946 0000".into()),
            company: Some("Analytical Engines Ltd".into()),
            subject: "Project inquiry".into(),
            message: "We would like to discuss a new website.".into(),
        }
    }

    #[test]
    fn test_valid_submission() {
        let msg = valid().validate(Some("1.2.3.4".into())).unwrap();
        assert_eq!(msg.name, "Ada Lovelace");
        assert_eq!(msg.ip.as_deref(), Some("1.2.3.4"));
    }

    #[test]
    fn test_reports_every_bad_field() {
        let submission = ContactSubmission {
            name: String::new(),
            email: "nope".into(),
            subject: "s".repeat(limits::SUBJECT_MAX + 1),
            message: "m".repeat(limits::MESSAGE_MAX + 1),
            ..valid()
        };
        let errors = submission.validate(None).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "subject", "message"]);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let submission: ContactSubmission = serde_json::from_str(r#"{"email":"a@example.com"}"#).unwrap();
        let errors = submission.validate(None).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "name" && e.message == "is required"));
    }
}
