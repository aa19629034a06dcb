use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DiscordError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Discord notifications are not configured")]
    Disabled,
    #[error("Could not reach Discord: {0}")]
    Connection(String),
    #[error("Rate limited by Discord. Retry in {0:.1}s")]
    RateLimited(f64),
    #[error("Webhook call failed. Error {status}. {message}")]
    Rejected { status: u16, message: String },
}
