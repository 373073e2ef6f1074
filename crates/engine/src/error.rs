use thiserror::Error;

/// Failures that abort a whole request. Per-selector evaluation trouble is
/// not here: it is collected into the report instead of propagated.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::ConfigError),

    #[error("Data error: {0}")]
    Data(#[from] market_data::DataError),
}
