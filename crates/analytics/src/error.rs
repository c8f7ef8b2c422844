use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Index '{0}' not found in data")]
    UnknownIndex(String),

    #[error("Invalid forward period: {0}")]
    InvalidPeriod(String),

    #[error("An unexpected error occurred during analytics calculation: {0}")]
    InternalError(String),
}
