//! User-visible notifications.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::blockchain::types::MarketError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Sending half of the notification channel, cloned into every controller.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn push(&self, level: Level, message: impl Into<String>) {
        // The front end may have gone away; notifications are best-effort.
        let _ = self.tx.send(Notification {
            level,
            message: message.into(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Level::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }

    /// Report a failed action. Rejections by the user stay silent.
    pub fn failure(&self, err: &MarketError, summary: &str) {
        match err {
            MarketError::UserRejected => {
                tracing::info!("{summary} Request rejected by user.");
            }
            MarketError::InvalidAmount(_)
            | MarketError::InvalidInput(_)
            | MarketError::ProviderUnavailable
            | MarketError::WrongChain { .. } => self.error(err.to_string()),
            MarketError::NotConnected => self.error("Connect your wallet first."),
            MarketError::InvalidSigner(_) => {
                tracing::error!(error = %err, "Contract bound with an unusable signer");
                self.error(summary);
            }
            MarketError::RemoteCallFailed(_) => {
                tracing::warn!(error = %err, "{summary}");
                self.error(format!("{summary} ({err})"));
            }
        }
    }
}
