use core_types::CacheKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access the result store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode or decode a stored result: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Stored entry for '{0}' is corrupt: {1}")]
    Corrupt(CacheKey, String),
}

/// A failed computation, as delivered to every caller attached to the same
/// flight. Cloneable because one failure fans out to many waiters.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Selector '{selector}' failed: {message}")]
pub struct EvalFailure {
    pub selector: String,
    pub message: String,
}

impl EvalFailure {
    pub fn new(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            message: message.into(),
        }
    }
}

/// Failures a `get_or_compute` caller can see. Store trouble is deliberately
/// absent: unreadable entries fall back to recomputation and unwritable ones
/// are logged, so neither fails the request.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Evaluation(#[from] EvalFailure),

    #[error("The computation for '{0}' ended without reporting a result")]
    Abandoned(CacheKey),
}
