//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeouts, body limit)
//!     → handler extracts ClientIp (client_ip.rs)
//!     → guards.rs (origin check, per-route rate limit)
//!     → body.rs (declared length, content type, bounded read)
//!     → contact.rs / newsletter.rs / webhook.rs / public.rs
//!     → error.rs (ApiError → JSON response, bare layer statuses too)
//! ```

pub mod body;
pub mod contact;
pub mod error;
pub mod extract;
pub mod guards;
pub mod newsletter;
pub mod public;
pub mod server;
pub mod webhook;

pub use error::ApiError;
pub use server::{AppState, HttpServer};
