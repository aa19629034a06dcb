//! Posts embed messages to a Discord channel webhook.
//!
//! [`DiscordWebhook`] is the reqwest-backed [`Notifier`]. Delivery is best effort: failures are logged and reported as
//! `false`, never as an error, so that a Discord outage cannot take down the jobs that call it.
mod config;
mod data_objects;
mod error;
mod helpers;
mod notifier;
mod webhook;

pub use config::DiscordConfig;
pub use data_objects::{Embed, EmbedField, WebhookPayload};
pub use error::DiscordError;
pub use helpers::{truncate_list, COLOR_GREEN, COLOR_RED, COLOR_YELLOW, FIELD_VALUE_LIMIT};
pub use notifier::Notifier;
pub use webhook::DiscordWebhook;
