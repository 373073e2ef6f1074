use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{NaiveDate, Utc};
use configuration::SelectorDefinition;
use core_types::{CacheKey, SelectionResult};
use engine::{SelectionReport, SelectionRequest, SelectorFailure, SelectorInfo};
use result_store::ResultStore;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SelectorsQuery {
    pub config_path: Option<PathBuf>,
}

/// Body of `POST /select`. Every field is optional; omitted fields fall back
/// to service defaults.
#[derive(Debug, Deserialize)]
pub struct SelectBody {
    pub date: Option<NaiveDate>,
    pub config_path: Option<PathBuf>,
    pub tickers: Option<Vec<String>>,
    /// Overrides merged over the configuration file, matched by class name.
    pub selector_configs: Option<Vec<SelectorDefinition>>,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    #[serde(default = "default_save_result")]
    pub save_result: bool,
}

/// Query-string form of `GET /select`. Tickers arrive comma-separated.
#[derive(Debug, Deserialize)]
pub struct SelectQuery {
    pub date: Option<NaiveDate>,
    pub config_path: Option<PathBuf>,
    pub tickers: Option<String>,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    #[serde(default = "default_save_result")]
    pub save_result: bool,
}

fn default_use_cache() -> bool {
    true
}

fn default_save_result() -> bool {
    true
}

impl SelectBody {
    fn into_request(self) -> SelectionRequest {
        SelectionRequest {
            trade_date: self.date,
            tickers: self.tickers,
            config_path: self.config_path,
            overrides: self.selector_configs,
            use_cache: self.use_cache,
            save_result: self.save_result,
        }
    }
}

impl SelectQuery {
    fn into_request(self) -> SelectionRequest {
        // An empty or blank tickers parameter means "no restriction", the
        // same as leaving it out.
        let tickers = self.tickers.and_then(|raw| {
            let list: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|ticker| !ticker.is_empty())
                .map(str::to_string)
                .collect();
            if list.is_empty() { None } else { Some(list) }
        });

        SelectionRequest {
            trade_date: self.date,
            tickers,
            config_path: self.config_path,
            overrides: None,
            use_cache: self.use_cache,
            save_result: self.save_result,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub success: bool,
    pub trade_date: NaiveDate,
    pub results: Vec<SelectionResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SelectorFailure>,
    pub message: String,
}

impl SelectResponse {
    fn from_report(report: SelectionReport) -> Self {
        let message = report.message();
        Self {
            success: true,
            trade_date: report.trade_date,
            results: report.results,
            failures: report.failures,
            message,
        }
    }
}

/// # GET /
/// Service identity and a map of the available endpoints.
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Sift Selection API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "RESTful interface for running selectors and querying stored results",
        "endpoints": {
            "GET /": "API information",
            "GET /health": "Health check",
            "GET /selectors": "List the activated selectors",
            "POST /select": "Run a selection",
            "GET /select": "Run a selection via query parameters",
            "GET /results/dates": "Dates with stored results",
            "GET /results/{date}": "All stored results for a date",
            "GET /results/{date}/{selector}": "One stored result",
        }
    }))
}

/// # GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let data_dir_exists = tokio::fs::try_exists(&state.data_dir).await.unwrap_or(false);
    let config_exists = tokio::fs::try_exists(&state.config_path).await.unwrap_or(false);

    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "data_dir_exists": data_dir_exists,
        "config_exists": config_exists,
    }))
}

/// # GET /selectors
/// Lists the selectors the configuration file activates, without running them.
pub async fn get_selectors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectorsQuery>,
) -> Result<Json<Vec<SelectorInfo>>, AppError> {
    let selectors = state
        .orchestrator
        .list_selectors(query.config_path.as_deref())?;
    Ok(Json(selectors))
}

/// # POST /select
/// Runs a selection. Individual selector failures appear in the report; only
/// resolution failures produce an error status.
pub async fn select_post(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectBody>,
) -> Result<Json<SelectResponse>, AppError> {
    let report = state.orchestrator.run(body.into_request()).await?;
    Ok(Json(SelectResponse::from_report(report)))
}

/// # GET /select
/// Query-parameter form of the selection endpoint, for quick manual use.
pub async fn select_get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectQuery>,
) -> Result<Json<SelectResponse>, AppError> {
    let report = state.orchestrator.run(query.into_request()).await?;
    Ok(Json(SelectResponse::from_report(report)))
}

/// # GET /results/dates
/// Dates that have at least one stored result, newest first.
pub async fn get_result_dates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let dates = state.store.list_dates().await?;
    Ok(Json(json!({
        "success": true,
        "dates": dates,
        "count": dates.len(),
    })))
}

/// # GET /results/:date
/// Every stored result for a date. An unknown date is an empty list, not an
/// error; unreadable entries are skipped with a log line.
pub async fn get_results_by_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<SelectResponse>, AppError> {
    let keys = state.store.keys_for_date(date).await?;

    let mut results = Vec::new();
    for key in &keys {
        match state.store.get(key).await {
            Ok(Some(result)) => results.push(result),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Skipping unreadable stored result");
            }
        }
    }

    let message = if results.is_empty() {
        format!("No results stored for {date}")
    } else {
        format!("Found results for {} selectors", results.len())
    };
    Ok(Json(SelectResponse {
        success: true,
        trade_date: date,
        results,
        failures: Vec::new(),
        message,
    }))
}

/// # GET /results/:date/:selector
/// One stored result, or 404 when that selector has nothing for the date.
pub async fn get_result_by_date_and_selector(
    State(state): State<Arc<AppState>>,
    Path((date, selector)): Path<(NaiveDate, String)>,
) -> Result<Json<SelectionResult>, AppError> {
    let key = CacheKey::new(date, selector);
    let result = state
        .store
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No stored result for {key}")))?;
    Ok(Json(result))
}
