//! Newsletter sign-up endpoint.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::body::read_json;
use crate::http::error::ApiError;
use crate::http::guards::{enforce_origin, enforce_rate_limit};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::validation::{limits, Validator};
use crate::security::ClientIp;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubscribeRequest {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
}

/// `POST /api/newsletter`: 201 for a new address, 200 if already subscribed.
pub async fn subscribe(
    State(state): State<AppState>,
    client: ClientIp,
    request: Request<Body>,
) -> Result<(StatusCode, Json<SubscribeResponse>), ApiError> {
    let config = state.config();
    let (parts, body) = request.into_parts();

    enforce_origin(&config, &parts.headers, &client)?;
    enforce_rate_limit(&state, &config, "newsletter", &client, &config.newsletter.rate_limit)?;

    let req: SubscribeRequest = read_json(&parts.headers, body, config.newsletter.max_body_bytes).await?;

    let mut v = Validator::new();
    let email = v.email("email", &req.email);
    let name = v.optional_text("name", req.name.as_deref(), limits::NAME_MAX);
    v.finish().map_err(|errors| {
        metrics::record_newsletter_signup("invalid");
        ApiError::Validation(errors)
    })?;

    let (subscriber, created) = state.store.subscribe(&email, name);
    if !created {
        metrics::record_newsletter_signup("duplicate");
        return Ok((
            StatusCode::OK,
            Json(SubscribeResponse {
                success: true,
                message: "You're already subscribed.".to_string(),
            }),
        ));
    }

    state.store.flush().await?;
    tracing::info!(subscriber = %subscriber.id, "Newsletter subscriber added");
    metrics::record_newsletter_signup("created");

    Ok((
        StatusCode::CREATED,
        Json(SubscribeResponse {
            success: true,
            message: "Thanks for subscribing!".to_string(),
        }),
    ))
}
