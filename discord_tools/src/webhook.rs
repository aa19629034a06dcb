use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{Client, StatusCode};

use crate::{
    config::DiscordConfig,
    data_objects::{RateLimitBody, WebhookPayload},
    helpers::retry_delay,
    DiscordError,
    Embed,
    Notifier,
};

/// Wait this long after a 429 if Discord does not say how long to wait.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
/// Never wait longer than this after a 429.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);
/// One try, plus one retry after a rate limit.
const MAX_ATTEMPTS: usize = 2;

#[derive(Clone)]
pub struct DiscordWebhook {
    config: DiscordConfig,
    client: Arc<Client>,
    default_retry_delay: Duration,
}

impl DiscordWebhook {
    pub fn new(config: DiscordConfig) -> Result<Self, DiscordError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| DiscordError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), default_retry_delay: DEFAULT_RETRY_DELAY })
    }

    /// Overrides the fallback wait used when a 429 carries no retry hint.
    pub fn with_default_retry_delay(mut self, delay: Duration) -> Self {
        self.default_retry_delay = delay.min(MAX_RETRY_DELAY);
        self
    }

    /// Posts the payload once. A 429 comes back as [`DiscordError::RateLimited`] carrying the wait in seconds.
    async fn post_once(&self, payload: &WebhookPayload) -> Result<(), DiscordError> {
        let url = self.config.webhook_url.reveal();
        let response =
            self.client.post(url).json(payload).send().await.map_err(|e| DiscordError::Connection(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("📣 Webhook accepted the message. {status}");
            return Ok(());
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let headers = response.headers().clone();
            let body = response.json::<RateLimitBody>().await.ok().and_then(|b| b.retry_after);
            let delay = retry_delay(&headers, body, self.default_retry_delay, MAX_RETRY_DELAY);
            return Err(DiscordError::RateLimited(delay.as_secs_f64()));
        }
        let message = response.text().await.unwrap_or_default();
        Err(DiscordError::Rejected { status: status.as_u16(), message })
    }

    /// Posts the embeds, retrying once after a rate limit.
    pub async fn send(&self, embeds: Vec<Embed>) -> Result<(), DiscordError> {
        if !self.config.is_enabled() {
            return Err(DiscordError::Disabled);
        }
        let payload = WebhookPayload { embeds };
        let mut attempt = 1;
        loop {
            match self.post_once(&payload).await {
                Err(DiscordError::RateLimited(secs)) if attempt < MAX_ATTEMPTS => {
                    warn!("📣 Discord rate limited the webhook. Retrying in {secs:.1}s");
                    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
                    attempt += 1;
                },
                result => return result,
            }
        }
    }
}

impl Notifier for DiscordWebhook {
    fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    async fn notify(&self, embeds: Vec<Embed>) -> bool {
        let count = embeds.len();
        match self.send(embeds).await {
            Ok(()) => {
                debug!("📣 Posted {count} embed(s) to Discord");
                true
            },
            Err(DiscordError::Disabled) => {
                trace!("📣 Discord is not configured. Dropping {count} embed(s)");
                false
            },
            Err(e) => {
                error!("📣 Could not post to Discord. {e}");
                false
            },
        }
    }
}
