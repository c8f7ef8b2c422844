use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read CSV from {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("Date column '{0}' not found in the CSV header")]
    MissingDateColumn(String),

    #[error("The CSV has no index columns besides the date column")]
    NoIndexColumns,

    #[error("Line {line}: cannot parse date '{value}'")]
    InvalidDate { line: usize, value: String },

    #[error("Line {line}, column '{column}': cannot parse value '{value}'")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Date {0} appears more than once")]
    DuplicateDate(String),

    #[error("The loaded data does not form a valid table: {0}")]
    Table(#[from] CoreError),
}
