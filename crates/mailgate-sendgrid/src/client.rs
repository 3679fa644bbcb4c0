//! HTTP client for SendGrid's `/v3/mail/send` endpoint.

use async_trait::async_trait;
use mailgate_core::{Email, Recipient, Transport};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

const SEND_PATH: &str = "/v3/mail/send";

#[derive(Error, Debug)]
pub enum SendGridError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
}

/// One message per request: a single personalization with a single recipient.
pub struct SendGridClient {
    client: reqwest::Client,
    api_host: String,
    api_key: String,
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "is_blank")]
    name: &'a str,
}

impl<'a> From<&'a Recipient> for Address<'a> {
    fn from(r: &'a Recipient) -> Self {
        Self {
            email: &r.address,
            name: &r.title,
        }
    }
}

fn is_blank(s: &&str) -> bool {
    s.is_empty()
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct MailSend<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

impl<'a> From<&'a Email> for MailSend<'a> {
    fn from(email: &'a Email) -> Self {
        Self {
            personalizations: [Personalization {
                to: [Address::from(&email.to)],
            }],
            from: Address::from(&email.from),
            subject: &email.subject,
            content: [Content {
                kind: "text/plain",
                value: &email.body,
            }],
        }
    }
}

impl SendGridClient {
    /// `api_host` should be like `https://api.sendgrid.com` (no trailing slash).
    pub fn new(api_host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_host: api_host.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn send_url(&self) -> String {
        format!("{}{}", self.api_host, SEND_PATH)
    }
}

#[async_trait]
impl Transport for SendGridClient {
    type Error = SendGridError;

    async fn deliver(&self, email: &Email) -> Result<(), SendGridError> {
        let url = self.send_url();
        debug!(url = %url, to = %email.to, "posting mail to SendGrid");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&MailSend::from(email))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SendGridError::Server {
                status: status.as_u16(),
                body,
            });
        }

        info!(status = status.as_u16(), to = %email.to, "message accepted by SendGrid");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn email() -> Email {
        Email {
            from: Recipient::new("SendGrid Notifier", "no-reply@no-where.tld"),
            to: Recipient::new("Ops", "ops@example.com"),
            subject: "disk full".into(),
            body: "/var is at 99%".into(),
        }
    }

    #[test]
    fn request_body_matches_v3_shape() {
        let email = email();
        let json = serde_json::to_value(MailSend::from(&email)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "personalizations": [{"to": [{"email": "ops@example.com", "name": "Ops"}]}],
                "from": {"email": "no-reply@no-where.tld", "name": "SendGrid Notifier"},
                "subject": "disk full",
                "content": [{"type": "text/plain", "value": "/var is at 99%"}]
            })
        );
    }

    #[test]
    fn empty_name_omitted() {
        let r = Recipient::new("", "ops@example.com");
        let json = serde_json::to_value(Address::from(&r)).unwrap();
        assert_eq!(json, serde_json::json!({"email": "ops@example.com"}));
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = SendGridClient::new("https://api.sendgrid.com/", "SG.x");
        assert_eq!(client.send_url(), "https://api.sendgrid.com/v3/mail/send");
    }

    /// Serve exactly one HTTP request with the given status line, returning
    /// the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if request_complete(&buf) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        });
        (host, handle)
    }

    fn request_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        buf.len() >= header_end + 4 + content_length
    }

    #[tokio::test]
    async fn accepted_response_is_success() {
        let (host, server) = serve_once("202 Accepted", "").await;
        let client = SendGridClient::new(host, "SG.secret");

        client.deliver(&email()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v3/mail/send "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sg.secret"));
        assert!(request.contains("\"subject\":\"disk full\""));
    }

    #[tokio::test]
    async fn error_status_is_server_error() {
        let (host, server) = serve_once("401 Unauthorized", "bad key").await;
        let client = SendGridClient::new(host, "SG.wrong");

        let err = client.deliver(&email()).await.unwrap_err();
        match err {
            SendGridError::Server { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("expected Server error, got {other:?}"),
        }
        server.await.unwrap();
    }
}
