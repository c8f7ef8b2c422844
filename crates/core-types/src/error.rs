use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid forward period '{0}', expected one of 1M, 3M, 6M, 1Y, 2Y, 3Y, 4Y")]
    InvalidPeriod(String),

    #[error("Column '{column}' has {actual} values but the table has {expected} dates")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Dates must be strictly increasing: {previous} is followed by {next}")]
    UnorderedDates { previous: String, next: String },

    #[error("Duplicate index column '{0}'")]
    DuplicateColumn(String),
}
