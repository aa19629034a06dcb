use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum JustTcgError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("No JustTCG API key is configured")]
    Disabled,
    #[error("Could not reach JustTCG: {0}")]
    Connection(String),
    #[error("JustTCG call failed. Error {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("Could not read the JustTCG response. {0}")]
    InvalidResponse(String),
    #[error("'{0}' is not a game JustTCG knows about")]
    UnknownGame(String),
}
