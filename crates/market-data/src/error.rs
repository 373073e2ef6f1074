use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("The data source contains no data at all.")]
    NoData,

    #[error("No instruments have data on {0}; nothing to select from.")]
    EmptyUniverse(NaiveDate),

    #[error("Failed to read market data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed market data in '{file}' line {line}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },
}
