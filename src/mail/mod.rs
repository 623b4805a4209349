//! Outbound email.
//!
//! # Data Flow
//! ```text
//! stored ContactMessage
//!     → templates.rs (notification + confirmation, escaped)
//!     → Mailer::dispatch_contact (both sent concurrently)
//!     → transport.rs (HTTP provider, or log-only when disabled)
//! ```
//!
//! Delivery is best effort: the message is already stored, so a failed
//! send is logged and counted but never fails the request.

pub mod templates;
pub mod transport;

pub use transport::{
    HttpMailTransport, LogMailTransport, MailError, MailTransport, MemoryMailTransport,
    OutboundEmail,
};

use std::sync::Arc;

use crate::config::MailConfig;
use crate::observability::metrics;
use crate::store::ContactMessage;

/// Which contact emails went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    pub notification_sent: bool,
    pub confirmation_sent: bool,
}

/// Sends contact-related emails through a pluggable transport.
#[derive(Clone)]
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
}

impl Mailer {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }

    /// Pick the HTTP transport when mail is enabled, log-only otherwise.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let transport: Arc<dyn MailTransport> = if config.enabled {
            Arc::new(HttpMailTransport::new(config)?)
        } else {
            Arc::new(LogMailTransport)
        };
        Ok(Self::new(transport))
    }

    async fn deliver(&self, kind: &'static str, email: OutboundEmail) -> bool {
        match self.transport.send(&email).await {
            Ok(()) => {
                metrics::record_email(kind, "sent");
                true
            }
            Err(e) => {
                tracing::error!(kind, error = %e, "Failed to send email");
                metrics::record_email(kind, "failed");
                false
            }
        }
    }

    /// Send the team notification and the submitter confirmation together.
    pub async fn dispatch_contact(&self, config: &MailConfig, msg: &ContactMessage) -> DispatchReport {
        let (notification_sent, confirmation_sent) = tokio::join!(
            self.deliver("notification", templates::notification(config, msg)),
            self.deliver("confirmation", templates::confirmation(config, msg)),
        );

        DispatchReport {
            notification_sent,
            confirmation_sent,
        }
    }
}
