use listpull_common::Secret;
use log::*;

pub const DEFAULT_BASE_URL: &str = "https://api.justtcg.com/v1";

#[derive(Debug, Clone)]
pub struct JustTcgConfig {
    /// Sent as the `x-api-key` header. Empty means price tracking is switched off.
    pub api_key: Secret<String>,
    /// The API root, without a trailing slash.
    pub base_url: String,
}

impl Default for JustTcgConfig {
    fn default() -> Self {
        Self { api_key: Secret::default(), base_url: DEFAULT_BASE_URL.to_string() }
    }
}

impl JustTcgConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self { api_key: Secret::new(api_key.into()), ..Default::default() }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reads `LP_JUSTTCG_API_KEY`, and `LP_JUSTTCG_URL` if you need to point at something other than the live API.
    pub fn new_from_env_or_default() -> Self {
        let api_key = std::env::var("LP_JUSTTCG_API_KEY").unwrap_or_else(|_| {
            info!("💹️ LP_JUSTTCG_API_KEY is not set. Price tracking is disabled.");
            String::default()
        });
        let config = Self::new(api_key.trim());
        match std::env::var("LP_JUSTTCG_URL") {
            Ok(url) if !url.trim().is_empty() => config.with_base_url(url.trim()),
            _ => config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let config = JustTcgConfig::new("key").with_base_url("http://localhost:9000/v1/");
        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert!(config.is_enabled());
        assert_eq!(JustTcgConfig::default().base_url, DEFAULT_BASE_URL);
        assert!(!JustTcgConfig::new(" ").is_enabled());
    }
}
