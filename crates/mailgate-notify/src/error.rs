use mailgate_core::{ConfigError, Recipient};
use mailgate_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// Nothing was sent.
    #[error("invalid notifier configuration: {0}")]
    ConfigInvalid(#[from] ConfigError),

    /// Delivery to `recipient` failed. No record was written, so a retry will
    /// attempt delivery again.
    #[error("failed to deliver to {recipient}: {source}")]
    DeliveryFailed {
        recipient: Recipient,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Every recipient received the message but the dedup record was not
    /// saved. The next call in the same window may send a duplicate.
    #[error("message delivered but failed to record {key}: {source}")]
    RecordPersistFailed {
        key: String,
        #[source]
        source: StoreError,
    },
}

impl NotifyError {
    /// Whether the message reached every recipient despite this error.
    pub fn delivered(&self) -> bool {
        matches!(self, NotifyError::RecordPersistFailed { .. })
    }
}
