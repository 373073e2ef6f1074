use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::EngineError;
use market_data::DataError;
use result_store::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Configuration mistakes and empty universes are the caller's fault and map
/// to 4xx with the full message; I/O trouble maps to 5xx with a generic body.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Engine(EngineError::Config(config_err)) => {
                tracing::warn!(error = %config_err, "Rejected request: configuration error.");
                (StatusCode::BAD_REQUEST, config_err.to_string())
            }
            AppError::Engine(EngineError::Data(DataError::NoData)) => {
                tracing::warn!("Rejected request: no market data available.");
                (StatusCode::NOT_FOUND, DataError::NoData.to_string())
            }
            AppError::Engine(EngineError::Data(data_err @ DataError::EmptyUniverse(_))) => {
                tracing::warn!(error = %data_err, "Rejected request: empty universe.");
                (StatusCode::BAD_REQUEST, data_err.to_string())
            }
            AppError::Engine(EngineError::Data(data_err)) => {
                tracing::error!(error = ?data_err, "Data error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal data error occurred".to_string(),
                )
            }
            AppError::Store(store_err) => {
                tracing::error!(error = ?store_err, "Result store error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal storage error occurred".to_string(),
                )
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
