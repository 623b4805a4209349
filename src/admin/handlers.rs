//! Admin inbox handlers: status, stats and message management.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admin::auth::AdminAccess;
use crate::http::error::ApiError;
use crate::http::extract::{ApiJson, ApiPath, ApiQuery};
use crate::http::server::AppState;
use crate::store::{ContactMessage, MessageStatus, Reply, StoreSummary};

pub const DEFAULT_LIST_LIMIT: usize = 50;
pub const MAX_LIST_LIMIT: usize = 100;

#[derive(Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub limit: Option<String>,
}

impl ListParams {
    /// Status must be a known value; limit an integer in `1..=100`.
    pub fn parse(&self) -> Result<(Option<MessageStatus>, usize), ApiError> {
        let status = match self.status.as_deref() {
            None | Some("") => None,
            Some(s) => Some(
                s.parse::<MessageStatus>()
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            ),
        };

        let limit = match self.limit.as_deref() {
            None | Some("") => DEFAULT_LIST_LIMIT,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|l| (1..=MAX_LIST_LIMIT).contains(l))
                .ok_or_else(|| {
                    ApiError::BadRequest(format!("limit must be an integer between 1 and {}", MAX_LIST_LIMIT))
                })?,
        };

        Ok((status, limit))
    }
}

#[derive(Serialize, Deserialize)]
pub struct MessageList {
    pub messages: Vec<ContactMessage>,
    pub count: usize,
}

#[derive(Serialize, Deserialize)]
pub struct MessageThread {
    pub message: ContactMessage,
    pub replies: Vec<Reply>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub async fn get_status(_: AdminAccess) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
    })
}

pub async fn get_stats(_: AdminAccess, State(state): State<AppState>) -> Json<StoreSummary> {
    Json(state.store.summary())
}

/// `GET /api/contact`
pub async fn list_messages(
    _: AdminAccess,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<MessageList>, ApiError> {
    let (status, limit) = params.parse()?;
    let messages = state.store.list_messages(status, limit);

    Ok(Json(MessageList {
        count: messages.len(),
        messages,
    }))
}

/// `GET /api/contact/{id}`
pub async fn get_message(
    _: AdminAccess,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageThread>, ApiError> {
    let message = state.store.get_message(&id).ok_or(ApiError::NotFound)?;
    let replies = state.store.replies_for(&id);
    Ok(Json(MessageThread { message, replies }))
}

/// `PATCH /api/contact/{id}`
pub async fn update_message(
    _: AdminAccess,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<ContactMessage>, ApiError> {
    let status = update
        .status
        .parse::<MessageStatus>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let message = state.store.update_status(&id, status).ok_or(ApiError::NotFound)?;
    state.store.flush().await?;

    tracing::info!(id = %id, status = %status, "Message status updated");
    Ok(Json(message))
}
