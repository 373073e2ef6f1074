//! # Sift Engine
//!
//! The orchestrator at the centre of the Sift system. For each request it
//! resolves the trade date and instrument universe, resolves the activated
//! selector set, and drives every selector through the result cache so each
//! `(date, selector)` pair is computed at most once.
//!
//! ## Architectural Principles
//!
//! - **Borrowed Capabilities:** The orchestrator owns no storage and no
//!   selector logic. It holds a `DataSource`, a `ResultCache`, and a
//!   `SelectorCatalog`, and composes them per request.
//! - **Registry Per Request:** Selector configuration is loaded into a fresh
//!   `SelectorRegistry` value for every request. There is no long-lived
//!   mutable configuration state anywhere in the system.
//! - **Partial Success:** One selector failing is a line in the report, not
//!   a failed request. Only date, universe, and configuration resolution
//!   abort the whole run.
//!
//! ## Public API
//!
//! - `Orchestrator`: the request execution engine.
//! - `SelectionRequest` / `SelectionReport`: its input and output values.
//! - `SelectorInfo`: one row of the activated-selector listing.
//! - `EngineError`: the fatal failure vocabulary.

use chrono::NaiveDate;
use configuration::SelectorDefinition;
use core_types::{CacheKey, SelectionResult, UniverseSnapshot};
use market_data::{DataSource, resolve_trade_date, resolve_universe};
use result_store::{CacheError, EvalFailure, ResultCache};
use selectors::{Selector, SelectorCatalog, SelectorRegistry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub mod error;

pub use error::EngineError;

/// Everything a caller can say about one selection run. Optional fields fall
/// back to service defaults: latest data date, full universe, base config.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    pub trade_date: Option<NaiveDate>,
    pub tickers: Option<Vec<String>>,
    pub config_path: Option<PathBuf>,
    pub overrides: Option<Vec<SelectorDefinition>>,
    pub use_cache: bool,
    pub save_result: bool,
}

impl Default for SelectionRequest {
    fn default() -> Self {
        Self {
            trade_date: None,
            tickers: None,
            config_path: None,
            overrides: None,
            use_cache: true,
            save_result: true,
        }
    }
}

/// The aggregated outcome of one selection run. `results` holds the
/// completed selectors in configuration order; `failures` the rest.
#[derive(Debug, Clone)]
pub struct SelectionReport {
    pub trade_date: NaiveDate,
    pub results: Vec<SelectionResult>,
    pub failures: Vec<SelectorFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectorFailure {
    pub class_name: String,
    pub message: String,
}

impl SelectionReport {
    /// Human summary for transports: how many selectors completed, and which
    /// ones did not.
    pub fn message(&self) -> String {
        let total = self.results.len() + self.failures.len();
        if self.failures.is_empty() {
            format!("{} of {} selectors completed", self.results.len(), total)
        } else {
            let failed: Vec<&str> = self
                .failures
                .iter()
                .map(|f| f.class_name.as_str())
                .collect();
            format!(
                "{} of {} selectors completed; failed: {}",
                self.results.len(),
                total,
                failed.join(", ")
            )
        }
    }
}

/// One row of the activated-selector listing.
#[derive(Debug, Clone, Serialize)]
pub struct SelectorInfo {
    pub class_name: String,
    pub alias: String,
    pub description: String,
}

/// The central orchestrator of the selection service.
pub struct Orchestrator {
    data: Arc<dyn DataSource>,
    cache: ResultCache,
    catalog: SelectorCatalog,
    default_config_path: PathBuf,
}

impl Orchestrator {
    pub fn new(
        data: Arc<dyn DataSource>,
        cache: ResultCache,
        catalog: SelectorCatalog,
        default_config_path: PathBuf,
    ) -> Self {
        Self {
            data,
            cache,
            catalog,
            default_config_path,
        }
    }

    /// Lists the activated selectors a config file resolves to, without
    /// running anything.
    pub fn list_selectors(
        &self,
        config_path: Option<&Path>,
    ) -> Result<Vec<SelectorInfo>, EngineError> {
        let registry = self.registry_for(config_path)?;
        let active = registry.activated(None)?;

        Ok(active
            .iter()
            .map(|entry| SelectorInfo {
                class_name: entry.definition.class_name.clone(),
                alias: entry.definition.display_alias().to_string(),
                description: entry.selector.description().to_string(),
            })
            .collect())
    }

    /// Executes one selection run.
    ///
    /// Resolution failures (date, universe, configuration) abort the run.
    /// Individual selector failures are collected into the report and never
    /// abort their siblings. The universe snapshot is loaded lazily: a run
    /// answered entirely from cache never touches bar data at all.
    pub async fn run(&self, request: SelectionRequest) -> Result<SelectionReport, EngineError> {
        let trade_date = resolve_trade_date(self.data.as_ref(), request.trade_date).await?;
        let universe = Arc::new(
            resolve_universe(self.data.as_ref(), request.tickers.as_deref(), trade_date).await?,
        );

        let registry = self.registry_for(request.config_path.as_deref())?;
        let active = registry.activated(request.overrides.as_deref())?;
        if active.is_empty() {
            tracing::warn!(%trade_date, "No selectors activated; nothing to run");
            return Ok(SelectionReport {
                trade_date,
                results: Vec::new(),
                failures: Vec::new(),
            });
        }

        tracing::info!(
            %trade_date,
            instruments = universe.len(),
            selectors = active.len(),
            use_cache = request.use_cache,
            "Starting selection run"
        );

        // Shared across this request's computations so the bar data is read
        // at most once, and only if some selector actually misses the cache.
        let snapshot_cell: Arc<OnceCell<UniverseSnapshot>> = Arc::new(OnceCell::new());

        let mut results = Vec::new();
        let mut failures = Vec::new();

        for entry in active {
            let key = CacheKey::new(trade_date, entry.definition.class_name.clone());
            let compute = {
                let data = Arc::clone(&self.data);
                let snapshot_cell = Arc::clone(&snapshot_cell);
                let universe = Arc::clone(&universe);
                let selector = Arc::clone(&entry.selector);
                let class_name = entry.definition.class_name.clone();
                let alias = entry.definition.display_alias().to_string();

                move || async move {
                    let snapshot = snapshot_cell
                        .get_or_try_init(|| async {
                            tracing::debug!(%trade_date, "Loading universe snapshot");
                            data.load_snapshot(trade_date, &universe).await
                        })
                        .await
                        .map_err(|e| EvalFailure::new(&class_name, e.to_string()))?;

                    let selection = selector
                        .evaluate(snapshot)
                        .map_err(|e| EvalFailure::new(&class_name, e.to_string()))?;

                    Ok(SelectionResult::new(class_name, alias, trade_date, selection))
                }
            };

            match self
                .cache
                .get_or_compute(key, request.use_cache, request.save_result, compute)
                .await
            {
                Ok(result) => {
                    tracing::info!(
                        selector = %result.selector_name,
                        count = result.count,
                        "Selector completed"
                    );
                    results.push(result);
                }
                Err(e) => {
                    let failure = match e {
                        CacheError::Evaluation(f) => SelectorFailure {
                            class_name: f.selector,
                            message: f.message,
                        },
                        other => SelectorFailure {
                            class_name: entry.definition.class_name.clone(),
                            message: other.to_string(),
                        },
                    };
                    tracing::warn!(
                        selector = %failure.class_name,
                        error = %failure.message,
                        "Selector failed"
                    );
                    failures.push(failure);
                }
            }
        }

        Ok(SelectionReport {
            trade_date,
            results,
            failures,
        })
    }

    fn registry_for(&self, config_path: Option<&Path>) -> Result<SelectorRegistry, EngineError> {
        let path = config_path.unwrap_or(&self.default_config_path);
        Ok(SelectorRegistry::load(self.catalog.clone(), path)?)
    }
}
