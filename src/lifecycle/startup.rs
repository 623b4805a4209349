//! Startup orchestration.
//!
//! # Responsibilities
//! - Restore the record store from its snapshot
//! - Build the mail transport
//! - Assemble the shared [`AppState`]
//!
//! Any error here is fatal: the gateway never serves traffic with a
//! store it could not read.

use thiserror::Error;

use crate::config::GatewayConfig;
use crate::http::AppState;
use crate::mail::{MailError, Mailer};
use crate::store::{MessageStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to restore store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to build mail transport: {0}")]
    Mail(#[from] MailError),
}

/// Build the application state for `config`.
pub fn build_state(config: GatewayConfig) -> Result<AppState, StartupError> {
    let store = match config.store.snapshot_path.as_deref() {
        Some(path) => MessageStore::load_from_file(path)?,
        None => {
            tracing::warn!("No snapshot path configured, records are kept in memory only");
            MessageStore::new(None)
        }
    };

    let mailer = Mailer::from_config(&config.mail)?;
    if !config.mail.enabled {
        tracing::info!("Mail delivery disabled, outbound emails are logged only");
    }

    Ok(AppState::new(config, store, mailer))
}
