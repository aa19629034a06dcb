use listpull_common::Secret;
use log::*;

#[derive(Debug, Clone, Default)]
pub struct DiscordConfig {
    /// The full webhook URL, including its token. Empty means Discord notifications are switched off.
    pub webhook_url: Secret<String>,
}

impl DiscordConfig {
    pub fn new<S: Into<String>>(webhook_url: S) -> Self {
        Self { webhook_url: Secret::new(webhook_url.into()) }
    }

    pub fn new_from_env_or_default() -> Self {
        let webhook_url = std::env::var("LP_DISCORD_WEBHOOK_URL").unwrap_or_else(|_| {
            info!("📣 LP_DISCORD_WEBHOOK_URL is not set. Discord notifications are disabled.");
            String::default()
        });
        Self::new(webhook_url.trim())
    }

    pub fn is_enabled(&self) -> bool {
        !self.webhook_url.is_empty()
    }
}
