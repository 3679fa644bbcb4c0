pub mod config;
pub mod policy;
pub mod recipient;
pub mod transport;

pub use config::{ConfigError, NotifierConfig, ResolvedConfig};
pub use policy::{FrequencyPolicy, dedup_key};
pub use recipient::Recipient;
pub use transport::{Email, Transport};
