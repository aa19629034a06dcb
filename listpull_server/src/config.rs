//! Server configuration
//!
//! Everything is read from `LP_*` environment variables (a `.env` file is loaded first, if present). Missing or
//! invalid values fall back to sensible defaults with a log message, so the server always starts.
//!
//! | Variable                 | Default                     |
//! |--------------------------|-----------------------------|
//! | `LP_HOST`                | `127.0.0.1`                 |
//! | `LP_PORT`                | `8370`                      |
//! | `LP_DATABASE_URL`        | `sqlite://data/listpull.db` |
//! | `LP_DISCORD_WEBHOOK_URL` | empty (Discord disabled)    |
//! | `LP_DIGEST_HOUR`         | `9`                         |
//! | `LP_DIGEST_TIMEZONE`     | `America/New_York`          |
//! | `LP_STALE_ORDER_HOURS`   | `48`                        |
//! | `LP_PICKUP_HOLD_DAYS`    | `7`                         |
//! | `LP_MAIL_API_URL`        | empty (log emails instead)  |
//! | `LP_MAIL_API_KEY`        | empty                       |
//! | `LP_MAIL_FROM`           | `orders@listpull.local`     |
//! | `LP_STORE_NAME`          | `ListPull`                  |
//! | `LP_STAFF_API_TOKEN`     | empty (staff API disabled)  |
use std::env;

use chrono::Duration;
use chrono_tz::Tz;
use discord_tools::DiscordConfig;
use listpull_common::{env_or_default, Secret};
use listpull_engine::mailer::HttpMailConfig;
use log::*;

const DEFAULT_LP_HOST: &str = "127.0.0.1";
const DEFAULT_LP_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/listpull.db";
const DEFAULT_STORE_NAME: &str = "ListPull";
const DEFAULT_MAIL_FROM: &str = "orders@listpull.local";
pub const DEFAULT_DIGEST_HOUR: u32 = 9;
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;
pub const DEFAULT_STALE_ORDER_HOURS: i64 = 48;
pub const DEFAULT_PICKUP_HOLD_DAYS: i64 = 7;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Shown in customer emails.
    pub store_name: String,
    /// Bearer token for the `/api` staff routes. When empty, every staff request is refused.
    pub staff_api_token: Secret<String>,
    pub mail: HttpMailConfig,
    pub notifications: NotificationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LP_HOST.to_string(),
            port: DEFAULT_LP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            store_name: DEFAULT_STORE_NAME.to_string(),
            staff_api_token: Secret::default(),
            mail: HttpMailConfig { from: DEFAULT_MAIL_FROM.to_string(), ..Default::default() },
            notifications: NotificationConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("LP_HOST").ok().unwrap_or_else(|| DEFAULT_LP_HOST.into());
        let port = env_or_default("LP_PORT", DEFAULT_LP_PORT);
        let database_url = env::var("LP_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ LP_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let store_name = env::var("LP_STORE_NAME").ok().unwrap_or_else(|| DEFAULT_STORE_NAME.into());
        let staff_api_token = Secret::new(env::var("LP_STAFF_API_TOKEN").unwrap_or_default().trim().to_string());
        if staff_api_token.is_empty() {
            warn!("🪛️ LP_STAFF_API_TOKEN is not set. All staff API requests will be refused.");
        }
        let mail = HttpMailConfig {
            api_url: env::var("LP_MAIL_API_URL").unwrap_or_default().trim().to_string(),
            api_key: Secret::new(env::var("LP_MAIL_API_KEY").unwrap_or_default().trim().to_string()),
            from: env::var("LP_MAIL_FROM").ok().unwrap_or_else(|| DEFAULT_MAIL_FROM.into()),
        };
        let notifications = NotificationConfig::from_env_or_default();
        Self { host, port, database_url, store_name, staff_api_token, mail, notifications }
    }
}

/// Settings for the Discord digest and stale-order alerts.
#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub discord: DiscordConfig,
    /// Local hour (0-23) at which the daily digest is posted.
    pub digest_hour: u32,
    /// The store's timezone. Digest hour and "today" are evaluated here.
    pub timezone: Tz,
    pub stale_order_hours: i64,
    pub pickup_hold_days: i64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig::default(),
            digest_hour: DEFAULT_DIGEST_HOUR,
            timezone: DEFAULT_TIMEZONE,
            stale_order_hours: DEFAULT_STALE_ORDER_HOURS,
            pickup_hold_days: DEFAULT_PICKUP_HOLD_DAYS,
        }
    }
}

impl NotificationConfig {
    pub fn from_env_or_default() -> Self {
        let discord = DiscordConfig::new_from_env_or_default();
        let digest_hour = parse_digest_hour(env::var("LP_DIGEST_HOUR").ok());
        let timezone = parse_timezone(env::var("LP_DIGEST_TIMEZONE").ok());
        let stale_order_hours = positive_or_default("LP_STALE_ORDER_HOURS", DEFAULT_STALE_ORDER_HOURS);
        let pickup_hold_days = positive_or_default("LP_PICKUP_HOLD_DAYS", DEFAULT_PICKUP_HOLD_DAYS);
        Self { discord, digest_hour, timezone, stale_order_hours, pickup_hold_days }
    }

    pub fn stale_order_threshold(&self) -> Duration {
        Duration::hours(self.stale_order_hours)
    }

    pub fn pickup_hold_threshold(&self) -> Duration {
        Duration::days(self.pickup_hold_days)
    }
}

fn positive_or_default(name: &str, default: i64) -> i64 {
    let value = env_or_default(name, default);
    if value > 0 {
        value
    } else {
        warn!("🪛️ {name} must be positive, but was {value}. Using {default} instead.");
        default
    }
}

/// Reads the digest hour, falling back to the default for anything that is not a whole number between 0 and 23.
pub fn parse_digest_hour(value: Option<String>) -> u32 {
    let Some(value) = value else {
        return DEFAULT_DIGEST_HOUR;
    };
    match value.trim().parse::<u32>() {
        Ok(h) if h < 24 => h,
        _ => {
            warn!("🪛️ '{value}' is not a valid LP_DIGEST_HOUR (0-23). Using {DEFAULT_DIGEST_HOUR} instead.");
            DEFAULT_DIGEST_HOUR
        },
    }
}

/// Reads an IANA timezone name, falling back to the default if it is missing or unknown.
pub fn parse_timezone(value: Option<String>) -> Tz {
    let Some(value) = value else {
        return DEFAULT_TIMEZONE;
    };
    value.trim().parse::<Tz>().unwrap_or_else(|e| {
        warn!("🪛️ '{value}' is not a valid LP_DIGEST_TIMEZONE. {e}. Using {DEFAULT_TIMEZONE} instead.");
        DEFAULT_TIMEZONE
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn digest_hour_validation() {
        assert_eq!(parse_digest_hour(None), 9);
        assert_eq!(parse_digest_hour(Some("17".into())), 17);
        assert_eq!(parse_digest_hour(Some(" 0 ".into())), 0);
        assert_eq!(parse_digest_hour(Some("24".into())), 9);
        assert_eq!(parse_digest_hour(Some("nine".into())), 9);
        assert_eq!(parse_digest_hour(Some("-1".into())), 9);
    }

    #[test]
    fn timezone_validation() {
        assert_eq!(parse_timezone(None), chrono_tz::America::New_York);
        assert_eq!(parse_timezone(Some("Europe/London".into())), chrono_tz::Europe::London);
        assert_eq!(parse_timezone(Some("Mars/Olympus_Mons".into())), chrono_tz::America::New_York);
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8370);
        assert!(config.staff_api_token.is_empty());
        assert!(!config.notifications.discord.is_enabled());
        assert_eq!(config.notifications.stale_order_threshold(), Duration::hours(48));
        assert_eq!(config.notifications.pickup_hold_threshold(), Duration::days(7));
    }
}
