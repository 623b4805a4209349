//! Contact Gateway Library

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod mail;
pub mod news;
pub mod observability;
pub mod security;
pub mod store;

pub use config::schema::GatewayConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
