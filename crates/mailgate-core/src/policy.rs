//! Frequency policies and dedup key derivation.
//!
//! A dedup key identifies the suppression window a notification falls into.
//! Two notifications with the same tag inside the same UTC bucket share a key,
//! so only the first of them is delivered.
//!
//! # Bucket formats
//!
//! - `OncePerHour`: `2026-03-14-09` (UTC date and hour)
//! - `OncePerDay`: `2026-03-14` (UTC date)
//! - `Always`: no bucket; the key is empty and never consulted

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// How often a notification with a given tag may be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrequencyPolicy {
    /// Deliver every time. The record store is never touched.
    #[default]
    Always,
    /// At most once per UTC hour per tag.
    #[serde(alias = "hourly")]
    OncePerHour,
    /// At most once per UTC day per tag.
    #[serde(alias = "daily")]
    OncePerDay,
}

impl FrequencyPolicy {
    /// Whether this policy suppresses repeats at all.
    pub fn deduplicates(self) -> bool {
        !matches!(self, FrequencyPolicy::Always)
    }

    fn bucket_format(self) -> Option<&'static str> {
        match self {
            FrequencyPolicy::Always => None,
            FrequencyPolicy::OncePerHour => Some("%Y-%m-%d-%H"),
            FrequencyPolicy::OncePerDay => Some("%Y-%m-%d"),
        }
    }
}

impl fmt::Display for FrequencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FrequencyPolicy::Always => "always",
            FrequencyPolicy::OncePerHour => "once-per-hour",
            FrequencyPolicy::OncePerDay => "once-per-day",
        };
        f.write_str(s)
    }
}

impl FromStr for FrequencyPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(FrequencyPolicy::Always),
            "once-per-hour" | "hourly" => Ok(FrequencyPolicy::OncePerHour),
            "once-per-day" | "daily" => Ok(FrequencyPolicy::OncePerDay),
            _ => Err(ConfigError::UnknownFrequency(s.to_string())),
        }
    }
}

/// Derive the dedup key for `tag` at time `now` under `policy`.
///
/// Returns `"<bucket>:<tag>"`, or an empty string for [`FrequencyPolicy::Always`].
/// An empty tag is valid and groups all untagged notifications together.
pub fn dedup_key(policy: FrequencyPolicy, tag: &str, now: DateTime<Utc>) -> String {
    match policy.bucket_format() {
        Some(fmt) => format!("{}:{}", now.format(fmt), tag),
        None => String::new(),
    }
}
