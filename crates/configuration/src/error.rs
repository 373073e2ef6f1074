use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load selector configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Selector configuration references unknown class '{0}'")]
    UnknownSelector(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}
