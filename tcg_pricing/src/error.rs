use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PricingError {
    #[error("Could not read the inventory CSV. {0}")]
    InvalidCsv(String),
    #[error("Could not write the inventory CSV. {0}")]
    CsvWriteError(String),
    #[error("'{0}' is not a valid repricing strategy. Use match_low, undercut or match_market.")]
    UnknownStrategy(String),
    #[error("'{0}' is not a valid alert direction. Use up, down or both.")]
    UnknownDirection(String),
    #[error("The price calculation overflowed. {0}")]
    Overflow(String),
}

impl From<csv::Error> for PricingError {
    fn from(e: csv::Error) -> Self {
        PricingError::InvalidCsv(e.to_string())
    }
}
