//! Size- and type-checked body reading.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap},
};
use serde::de::DeserializeOwned;

use crate::http::error::ApiError;

/// Reject early when the declared length is already over the cap.
pub fn check_declared_length(headers: &HeaderMap, max_bytes: usize) -> Result<(), ApiError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match declared {
        Some(len) if len > max_bytes as u64 => Err(ApiError::PayloadTooLarge),
        _ => Ok(()),
    }
}

/// `application/json`, with or without parameters such as charset.
pub fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false);

    if is_json {
        Ok(())
    } else {
        Err(ApiError::UnsupportedMediaType)
    }
}

/// Buffer at most `max_bytes`. Chunked bodies that run over are cut off.
pub async fn read_limited(body: Body, max_bytes: usize) -> Result<Bytes, ApiError> {
    axum::body::to_bytes(body, max_bytes)
        .await
        .map_err(|_| ApiError::PayloadTooLarge)
}

/// Length check, content-type check, bounded read and JSON decode.
pub async fn read_json<T: DeserializeOwned>(
    headers: &HeaderMap,
    body: Body,
    max_bytes: usize,
) -> Result<T, ApiError> {
    check_declared_length(headers, max_bytes)?;
    require_json(headers)?;
    let bytes = read_limited(body, max_bytes).await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}
