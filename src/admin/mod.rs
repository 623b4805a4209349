//! Authenticated admin API backing the site's inbox panel and the CLI.

pub mod auth;
pub mod handlers;

use axum::{routing::get, Router};

use crate::http::server::AppState;
use self::handlers::{get_stats, get_status};

pub use auth::AdminAccess;

/// `/admin/*` routes. The inbox routes under `/api/contact` are mounted
/// by the main router next to the public POST.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/stats", get(get_stats))
}
