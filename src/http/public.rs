//! Unauthenticated read-only endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::extract::ApiQuery;
use crate::http::server::AppState;
use crate::news::{categorized_items, CategorizedItem};

#[derive(Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

/// `GET /health`
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsParams {
    pub category: Option<String>,
}

#[derive(Serialize)]
pub struct NewsResponse {
    pub items: Vec<CategorizedItem>,
    pub count: usize,
    pub categories: Vec<String>,
}

/// `GET /api/news`
pub async fn news(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<NewsParams>,
) -> Result<Json<NewsResponse>, ApiError> {
    let config = state.config();
    let filter = params.category.as_deref().filter(|c| !c.is_empty());
    let items = categorized_items(&config.news, filter);

    let mut categories: Vec<String> = config.news.categories.iter().map(|c| c.name.clone()).collect();
    categories.push(config.news.default_category.clone());

    Ok(Json(NewsResponse {
        count: items.len(),
        items,
        categories,
    }))
}
