//! The dedup gate.
//!
//! Flow for one [`Notifier::send`] call:
//!
//! 1. Resolve configuration (fails fast on a missing API key or recipients).
//! 2. Derive the dedup key from the frequency policy, tag and current time.
//! 3. Unless the policy is `Always`, consult the record store. An unreadable
//!    store is logged and treated as "not sent yet".
//! 4. Deliver to each recipient in order, stopping at the first failure.
//! 5. Unless the policy is `Always`, record the key with the subject.

use chrono::{DateTime, Utc};
use mailgate_core::{Email, NotifierConfig, Transport, dedup_key};
use mailgate_store::RecordStore;
use tracing::{error, info, warn};

use crate::NotifyError;

/// What happened to a notification that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Delivered to `recipients` addresses. `key` is empty for `Always`.
    Sent { key: String, recipients: usize },
    /// Suppressed: `key` was already recorded.
    Skipped { key: String },
}

impl Outcome {
    pub fn key(&self) -> &str {
        match self {
            Outcome::Sent { key, .. } | Outcome::Skipped { key } => key,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Outcome::Sent { .. })
    }
}

/// Sends notifications through `T`, suppressing repeats within the
/// configured frequency window.
///
/// Each call opens the record store, reads or writes it, and closes it again.
/// Calls against the same store file must not overlap.
pub struct Notifier<T> {
    config: NotifierConfig,
    transport: T,
}

impl<T: Transport> Notifier<T> {
    pub fn new(config: NotifierConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Send `subject`/`body` to every configured recipient unless an
    /// equivalent notification was already sent in the current window.
    pub async fn send(&self, subject: &str, body: &str) -> Result<Outcome, NotifyError> {
        self.send_at(subject, body, Utc::now()).await
    }

    /// [`send`](Self::send) with an explicit clock reading.
    pub async fn send_at(
        &self,
        subject: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Outcome, NotifyError> {
        let config = self.config.resolve().inspect_err(|e| {
            error!(error = %e, "failed to send notification");
        })?;

        let dedup = config.frequency.deduplicates();
        let key = dedup_key(config.frequency, &config.tag, now);
        let store = RecordStore::new(&config.store_path);

        if dedup && already_sent(&store, &key) {
            info!(key = %key, subject, "skipping notification already sent in this window");
            return Ok(Outcome::Skipped { key });
        }

        info!(
            tag = %config.tag,
            frequency = %config.frequency,
            recipients = config.to.len(),
            subject,
            "sending notification"
        );

        for recipient in &config.to {
            let email = Email {
                from: config.from.clone(),
                to: recipient.clone(),
                subject: subject.to_string(),
                body: body.to_string(),
            };
            if let Err(e) = self.transport.deliver(&email).await {
                error!(recipient = %recipient, error = %e, "failed to deliver notification");
                return Err(NotifyError::DeliveryFailed {
                    recipient: recipient.clone(),
                    source: Box::new(e),
                });
            }
            info!(recipient = %recipient, "notification delivered");
        }

        if dedup {
            if let Err(source) = store.record(&key, subject) {
                warn!(key = %key, error = %source, "notification delivered but not recorded");
                return Err(NotifyError::RecordPersistFailed { key, source });
            }
        }

        Ok(Outcome::Sent {
            key,
            recipients: config.to.len(),
        })
    }
}

/// Fail-open lookup: a store that cannot be read counts as "not sent".
fn already_sent(store: &RecordStore, key: &str) -> bool {
    match store.load() {
        Ok(records) => records.contains_key(key),
        Err(e) => {
            warn!(error = %e, "failed to load record store, sending anyway");
            false
        }
    }
}
