//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and security checks produce:
//!     → logging.rs (structured tracing events, `security` target for rejections)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout (text or JSON)
//!     → Prometheus scrape endpoint
//! ```

pub mod logging;
pub mod metrics;
