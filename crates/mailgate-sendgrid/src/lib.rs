//! SendGrid transport: delivers mailgate emails through the v3 mail send API.

pub mod client;

pub use client::{SendGridClient, SendGridError};
