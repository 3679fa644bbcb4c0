//! Email identities: a display name plus an address.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Display name. May be empty.
    #[serde(default)]
    pub title: String,
    pub address: String,
}

impl Recipient {
    pub fn new(title: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.is_empty() {
            f.write_str(&self.address)
        } else {
            write!(f, "{} <{}>", self.title, self.address)
        }
    }
}

/// Parses `Name <addr@host>` or a bare `addr@host`.
impl FromStr for Recipient {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (title, address) = match (s.find('<'), s.ends_with('>')) {
            (Some(open), true) => (s[..open].trim(), s[open + 1..s.len() - 1].trim()),
            (None, false) => ("", s),
            _ => return Err(ConfigError::InvalidRecipient(s.to_string())),
        };

        if address.is_empty() || !address.contains('@') || address.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidRecipient(s.to_string()));
        }

        Ok(Recipient::new(title.trim_matches('"'), address))
    }
}
