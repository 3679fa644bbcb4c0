//! Dedup gate in front of outbound email delivery.

mod error;
pub use error::NotifyError;

mod notifier;
pub use notifier::{Notifier, Outcome};
