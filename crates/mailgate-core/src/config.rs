//! Notifier configuration and default resolution.
//!
//! [`NotifierConfig`] is what callers fill in; every field except the API key
//! and recipients is optional. [`NotifierConfig::resolve`] validates it and
//! returns a new [`ResolvedConfig`] with defaults applied. The input is never
//! mutated.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::{FrequencyPolicy, Recipient};

pub const DEFAULT_API_HOST: &str = "https://api.sendgrid.com";
pub const DEFAULT_SENDER_TITLE: &str = "SendGrid Notifier";
pub const DEFAULT_SENDER_ADDRESS: &str = "no-reply@no-where.tld";
pub const DEFAULT_TAG: &str = "default_tag";
pub const DEFAULT_STORE_PATH: &str = "notifier.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SendGrid API key is not set")]
    MissingApiKey,

    #[error("recipients are not set")]
    NoRecipients,

    #[error("invalid recipient: {0:?}")]
    InvalidRecipient(String),

    #[error("unknown frequency policy: {0:?}")]
    UnknownFrequency(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Base URL of the mail API. Defaults to [`DEFAULT_API_HOST`].
    pub api_host: Option<String>,
    /// Required.
    pub api_key: Option<String>,
    pub from: Option<Recipient>,
    /// Required, non-empty.
    pub to: Vec<Recipient>,
    pub frequency: FrequencyPolicy,
    pub tag: Option<String>,
    pub store_path: Option<PathBuf>,
}

/// A fully-populated configuration. Only produced by [`NotifierConfig::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub api_host: String,
    pub api_key: String,
    pub from: Recipient,
    pub to: Vec<Recipient>,
    pub frequency: FrequencyPolicy,
    pub tag: String,
    pub store_path: PathBuf,
}

impl NotifierConfig {
    /// Validate and fill in defaults.
    ///
    /// Blank strings count as unset, so `tag: Some("")` resolves to
    /// [`DEFAULT_TAG`] and a blank sender address falls back to the default sender.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let api_key = non_blank(self.api_key.as_deref()).ok_or(ConfigError::MissingApiKey)?;
        if self.to.is_empty() {
            return Err(ConfigError::NoRecipients);
        }

        let from = match &self.from {
            Some(r) if !r.address.trim().is_empty() => r.clone(),
            _ => Recipient::new(DEFAULT_SENDER_TITLE, DEFAULT_SENDER_ADDRESS),
        };

        Ok(ResolvedConfig {
            api_host: non_blank(self.api_host.as_deref())
                .unwrap_or(DEFAULT_API_HOST)
                .to_string(),
            api_key: api_key.to_string(),
            from,
            to: self.to.clone(),
            frequency: self.frequency,
            tag: non_blank(self.tag.as_deref())
                .unwrap_or(DEFAULT_TAG)
                .to_string(),
            store_path: self
                .store_path
                .clone()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
        })
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}
