//! The mail delivery boundary.

use async_trait::async_trait;

use crate::Recipient;

/// A single plaintext message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: Recipient,
    pub to: Recipient,
    pub subject: String,
    pub body: String,
}

/// Something that can deliver an [`Email`].
///
/// Implementations report success or failure for exactly one message and do
/// not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn deliver(&self, email: &Email) -> Result<(), Self::Error>;
}

