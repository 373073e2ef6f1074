use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("Selector received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("An error occurred during indicator calculation: {0}")]
    IndicatorError(String),
}
