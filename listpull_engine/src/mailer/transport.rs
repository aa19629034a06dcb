use std::sync::Arc;

use listpull_common::Secret;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MailError {
    #[error("Could not initialize mail client: {0}")]
    Initialization(String),
    #[error("Could not reach the mail service: {0}")]
    Connection(String),
    #[error("Mail service rejected the message. Error {status}. {message}")]
    Rejected { status: u16, message: String },
}

/// A rendered, ready-to-send email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Something that can deliver an [`EmailMessage`].
///
/// `Ok(true)` means the message was accepted. `Ok(false)` means the transport declined it without a specific error.
/// Either `Ok(false)` or an `Err` counts as a failed attempt.
#[allow(async_fn_in_trait)]
pub trait MailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<bool, MailError>;
}

impl<T: MailTransport> MailTransport for Arc<T> {
    async fn send(&self, message: &EmailMessage) -> Result<bool, MailError> {
        self.as_ref().send(message).await
    }
}

//--------------------------------------  HttpMailTransport   ---------------------------------------------------------
#[derive(Debug, Clone, Default)]
pub struct HttpMailConfig {
    /// The endpoint that accepts `{from, to, subject, text}` JSON payloads.
    pub api_url: String,
    pub api_key: Secret<String>,
    pub from: String,
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Delivers mail through a transactional email HTTP API using a bearer API key.
#[derive(Clone)]
pub struct HttpMailTransport {
    config: HttpMailConfig,
    client: Arc<Client>,
}

impl HttpMailTransport {
    pub fn new(config: HttpMailConfig) -> Result<Self, MailError> {
        let mut headers = HeaderMap::with_capacity(2);
        if !config.api_key.is_empty() {
            let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
                .map_err(|e| MailError::Initialization(e.to_string()))?;
            headers.insert(AUTHORIZATION, val);
        }
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| MailError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }
}

impl MailTransport for HttpMailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<bool, MailError> {
        let payload =
            MailPayload { from: &self.config.from, to: &message.to, subject: &message.subject, text: &message.text };
        trace!("📧 Posting email for {} to {}", message.to, self.config.api_url);
        let response = self
            .client
            .post(&self.config.api_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Connection(e.to_string()))?;
        if response.status().is_success() {
            trace!("📧 Mail service accepted the message. {}", response.status());
            Ok(true)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(MailError::Rejected { status, message })
        }
    }
}

//--------------------------------------   LogMailTransport   ---------------------------------------------------------
/// Development transport. Writes the message to the log and reports success.
#[derive(Debug, Clone, Default)]
pub struct LogMailTransport;

impl MailTransport for LogMailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<bool, MailError> {
        info!("📧 [dev mail] To: {} | Subject: {}\n{}", message.to, message.subject, message.text);
        Ok(true)
    }
}

//--------------------------------------  ConfiguredTransport  ---------------------------------------------------------
/// The transport picked at start-up: HTTP delivery when a mail API URL is configured, otherwise the log transport.
#[derive(Clone)]
pub enum ConfiguredTransport {
    Http(HttpMailTransport),
    Log(LogMailTransport),
}

impl ConfiguredTransport {
    pub fn from_config(config: HttpMailConfig) -> Result<Self, MailError> {
        if config.api_url.trim().is_empty() {
            warn!("📧 No mail API URL is configured. Emails will be written to the log instead of being sent.");
            Ok(Self::Log(LogMailTransport))
        } else {
            info!("📧 Emails will be delivered via {}", config.api_url);
            Ok(Self::Http(HttpMailTransport::new(config)?))
        }
    }
}

impl MailTransport for ConfiguredTransport {
    async fn send(&self, message: &EmailMessage) -> Result<bool, MailError> {
        match self {
            Self::Http(t) => t.send(message).await,
            Self::Log(t) => t.send(message).await,
        }
    }
}
