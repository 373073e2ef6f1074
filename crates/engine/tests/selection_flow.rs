//! End-to-end tests for the orchestrator: configuration resolution, date and
//! universe resolution, cached execution, and partial-failure reporting.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use configuration::SelectorDefinition;
use core_types::{Bar, CacheKey, Selection, UniverseSnapshot};
use engine::{EngineError, Orchestrator, SelectionRequest};
use market_data::{DataError, DataSource};
use result_store::{MemoryResultStore, ResultCache, ResultStore};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use selectors::{Selector, SelectorCatalog, SelectorError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const MOMENTUM_ONLY: &str = r#"{
    "selectors": [
        { "class": "Momentum", "alias": "Fast Movers", "params": { "lookback": 2, "top_n": 2 } }
    ]
}"#;

const MOMENTUM_AND_EXPLOSIVE: &str = r#"{
    "selectors": [
        { "class": "Momentum", "params": { "lookback": 2, "top_n": 2 } },
        { "class": "Explosive" }
    ]
}"#;

const MOMENTUM_AND_INACTIVE_BREAKOUT: &str = r#"{
    "selectors": [
        { "class": "Momentum", "params": { "lookback": 2, "top_n": 2 } },
        { "class": "Breakout", "activate": false, "params": { "window": 2 } }
    ]
}"#;

const ALL_INACTIVE: &str = r#"{
    "selectors": [
        { "class": "Momentum", "activate": false }
    ]
}"#;

const BREAKOUT_ONLY: &str = r#"{
    "selectors": [
        { "class": "Breakout", "params": { "window": 2 } }
    ]
}"#;

/// In-memory data source over three instruments, counting snapshot loads so
/// tests can tell a cache hit from a recompute.
///
/// Closes over 2025-01-13..15: ALPHA drifts up (roc 20), BRAVO jumps on the
/// last day (roc 50), CHARLIE fades (roc -10).
struct CountingSource {
    series: BTreeMap<String, Vec<Bar>>,
    snapshot_loads: AtomicUsize,
}

impl CountingSource {
    fn sample() -> Arc<Self> {
        let start = date("2025-01-13");
        let closes: &[(&str, &[f64])] = &[
            ("ALPHA", &[10.0, 11.0, 12.0]),
            ("BRAVO", &[10.0, 10.0, 15.0]),
            ("CHARLIE", &[10.0, 10.0, 9.0]),
        ];

        let mut series = BTreeMap::new();
        for (ticker, values) in closes {
            let bars = values
                .iter()
                .enumerate()
                .map(|(i, close)| bar(start + Days::new(i as u64), *close))
                .collect();
            series.insert(ticker.to_string(), bars);
        }
        Arc::new(Self {
            series,
            snapshot_loads: AtomicUsize::new(0),
        })
    }

    fn loads(&self) -> usize {
        self.snapshot_loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for CountingSource {
    async fn latest_date(&self) -> Result<Option<NaiveDate>, DataError> {
        Ok(self
            .series
            .values()
            .filter_map(|bars| bars.last())
            .map(|last| last.date)
            .max())
    }

    async fn tickers_on(&self, date: NaiveDate) -> Result<Vec<String>, DataError> {
        Ok(self
            .series
            .iter()
            .filter(|(_, bars)| bars.iter().any(|bar| bar.date == date))
            .map(|(ticker, _)| ticker.clone())
            .collect())
    }

    async fn load_snapshot(
        &self,
        date: NaiveDate,
        tickers: &[String],
    ) -> Result<UniverseSnapshot, DataError> {
        self.snapshot_loads.fetch_add(1, Ordering::SeqCst);
        let mut series = BTreeMap::new();
        for ticker in tickers {
            let Some(bars) = self.series.get(ticker) else {
                continue;
            };
            let history: Vec<Bar> = bars
                .iter()
                .filter(|bar| bar.date <= date)
                .cloned()
                .collect();
            if !history.is_empty() {
                series.insert(ticker.clone(), history);
            }
        }
        Ok(UniverseSnapshot {
            trade_date: date,
            series,
        })
    }
}

/// Selector that always fails, for exercising partial-failure reporting.
#[derive(Debug)]
struct ExplosiveSelector;

impl Selector for ExplosiveSelector {
    fn class_name(&self) -> &'static str {
        "Explosive"
    }

    fn description(&self) -> &'static str {
        "Fails on every evaluation"
    }

    fn evaluate(&self, _snapshot: &UniverseSnapshot) -> Result<Selection, SelectorError> {
        Err(SelectorError::IndicatorError("kaboom".to_string()))
    }
}

struct Harness {
    orchestrator: Orchestrator,
    source: Arc<CountingSource>,
    store: Arc<MemoryResultStore>,
    config_dir: TempDir,
}

impl Harness {
    fn new(config: &str) -> Self {
        let config_dir = TempDir::new().unwrap();
        let config_path = config_dir.path().join("selectors.json");
        std::fs::write(&config_path, config).unwrap();

        let source = CountingSource::sample();
        let store = Arc::new(MemoryResultStore::new());
        let cache = ResultCache::new(store.clone());

        let mut catalog = SelectorCatalog::builtin();
        catalog.register("Explosive", |_params| Ok(Box::new(ExplosiveSelector)));

        let orchestrator = Orchestrator::new(source.clone(), cache, catalog, config_path);
        Self {
            orchestrator,
            source,
            store,
            config_dir,
        }
    }

    /// Writes a second config file next to the default one and returns its path.
    fn extra_config(&self, name: &str, config: &str) -> std::path::PathBuf {
        let path = self.config_dir.path().join(name);
        std::fs::write(&path, config).unwrap();
        path
    }
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn bar(date: NaiveDate, close: f64) -> Bar {
    let close = Decimal::from_f64(close).unwrap();
    Bar {
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume: Decimal::ONE_THOUSAND,
    }
}

#[tokio::test]
async fn full_run_selects_persists_and_reports() {
    let h = Harness::new(MOMENTUM_ONLY);

    let report = h
        .orchestrator
        .run(SelectionRequest::default())
        .await
        .unwrap();

    // No date requested: the latest date in the data wins.
    assert_eq!(report.trade_date, date("2025-01-15"));
    assert!(report.failures.is_empty());
    assert_eq!(report.message(), "1 of 1 selectors completed");

    let result = &report.results[0];
    assert_eq!(result.selector_name, "Momentum");
    assert_eq!(result.alias, "Fast Movers");
    assert_eq!(result.selected, vec!["BRAVO", "ALPHA"]);
    assert_eq!(result.count, 2);
    assert_eq!(result.scores.len(), 3);
    assert!(result.scores["BRAVO"] > result.scores["ALPHA"]);

    let stored = h
        .store
        .get(&CacheKey::new(date("2025-01-15"), "Momentum"))
        .await
        .unwrap();
    assert_eq!(stored, Some(result.clone()));
}

#[tokio::test]
async fn explicit_trade_date_is_used_as_given() {
    let h = Harness::new(MOMENTUM_ONLY);

    let request = SelectionRequest {
        trade_date: Some(date("2025-01-14")),
        ..Default::default()
    };
    let report = h.orchestrator.run(request).await.unwrap();

    assert_eq!(report.trade_date, date("2025-01-14"));
    // Two bars of history is below min_history, so nothing qualifies, but
    // the run itself still succeeds and persists an empty result.
    assert_eq!(report.results[0].count, 0);
    assert!(
        h.store
            .get(&CacheKey::new(date("2025-01-14"), "Momentum"))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn second_identical_run_never_touches_bar_data() {
    let h = Harness::new(MOMENTUM_ONLY);

    let first = h
        .orchestrator
        .run(SelectionRequest::default())
        .await
        .unwrap();
    assert_eq!(h.source.loads(), 1);

    let second = h
        .orchestrator
        .run(SelectionRequest::default())
        .await
        .unwrap();

    assert_eq!(second.results, first.results);
    assert_eq!(h.source.loads(), 1);
}

#[tokio::test]
async fn disabling_the_cache_forces_a_recompute() {
    let h = Harness::new(MOMENTUM_ONLY);

    h.orchestrator
        .run(SelectionRequest::default())
        .await
        .unwrap();

    let request = SelectionRequest {
        use_cache: false,
        ..Default::default()
    };
    h.orchestrator.run(request).await.unwrap();

    assert_eq!(h.source.loads(), 2);
}

#[tokio::test]
async fn disabling_save_leaves_the_store_empty() {
    let h = Harness::new(MOMENTUM_ONLY);

    let request = SelectionRequest {
        save_result: false,
        ..Default::default()
    };
    let report = h.orchestrator.run(request).await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn one_failing_selector_is_reported_not_fatal() {
    let h = Harness::new(MOMENTUM_AND_EXPLOSIVE);

    let report = h
        .orchestrator
        .run(SelectionRequest::default())
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].selector_name, "Momentum");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].class_name, "Explosive");
    assert!(report.failures[0].message.contains("kaboom"));
    assert_eq!(report.message(), "1 of 2 selectors completed; failed: Explosive");

    // The failed selector must not have written anything.
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn inactive_definitions_are_not_run() {
    let h = Harness::new(MOMENTUM_AND_INACTIVE_BREAKOUT);

    let report = h
        .orchestrator
        .run(SelectionRequest::default())
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].selector_name, "Momentum");
}

#[tokio::test]
async fn no_activated_selectors_is_an_empty_success() {
    let h = Harness::new(ALL_INACTIVE);

    let report = h
        .orchestrator
        .run(SelectionRequest::default())
        .await
        .unwrap();

    assert_eq!(report.trade_date, date("2025-01-15"));
    assert!(report.results.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(report.message(), "0 of 0 selectors completed");
    assert_eq!(h.source.loads(), 0);
}

#[tokio::test]
async fn unknown_override_class_aborts_the_run() {
    let h = Harness::new(MOMENTUM_ONLY);

    let request = SelectionRequest {
        overrides: Some(vec![SelectorDefinition::new("Ouija")]),
        ..Default::default()
    };
    let err = h.orchestrator.run(request).await.unwrap_err();

    assert!(matches!(err, EngineError::Config(_)));
    assert_eq!(h.source.loads(), 0);
}

#[tokio::test]
async fn request_tickers_narrow_the_universe() {
    let h = Harness::new(MOMENTUM_ONLY);

    let request = SelectionRequest {
        tickers: Some(vec!["ALPHA".to_string(), "CHARLIE".to_string()]),
        ..Default::default()
    };
    let report = h.orchestrator.run(request).await.unwrap();

    let result = &report.results[0];
    assert_eq!(result.scores.len(), 2);
    assert!(!result.scores.contains_key("BRAVO"));
    assert_eq!(result.selected, vec!["ALPHA", "CHARLIE"]);
}

#[tokio::test]
async fn unknown_tickers_resolve_to_an_empty_universe() {
    let h = Harness::new(MOMENTUM_ONLY);

    let request = SelectionRequest {
        tickers: Some(vec!["NOSUCH".to_string()]),
        ..Default::default()
    };
    let err = h.orchestrator.run(request).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::Data(DataError::EmptyUniverse(d)) if d == date("2025-01-15")
    ));
}

#[tokio::test]
async fn override_params_change_the_selection() {
    let h = Harness::new(MOMENTUM_ONLY);

    let mut narrow = SelectorDefinition::new("Momentum");
    narrow
        .params
        .insert("lookback".to_string(), serde_json::Value::from(2));
    narrow
        .params
        .insert("top_n".to_string(), serde_json::Value::from(1));

    let request = SelectionRequest {
        overrides: Some(vec![narrow]),
        use_cache: false,
        ..Default::default()
    };
    let report = h.orchestrator.run(request).await.unwrap();

    assert_eq!(report.results[0].selected, vec!["BRAVO"]);
}

#[tokio::test]
async fn alternate_config_path_is_honored() {
    let h = Harness::new(MOMENTUM_ONLY);
    let breakout_config = h.extra_config("breakout.json", BREAKOUT_ONLY);

    let request = SelectionRequest {
        config_path: Some(breakout_config),
        ..Default::default()
    };
    let report = h.orchestrator.run(request).await.unwrap();

    let result = &report.results[0];
    assert_eq!(result.selector_name, "Breakout");
    assert_eq!(result.selected, vec!["BRAVO", "ALPHA"]);
}

#[tokio::test]
async fn list_selectors_reports_activated_only() {
    let h = Harness::new(MOMENTUM_AND_INACTIVE_BREAKOUT);

    let infos = h.orchestrator.list_selectors(None).unwrap();

    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].class_name, "Momentum");
    assert_eq!(infos[0].alias, "Momentum");
    assert!(!infos[0].description.is_empty());
}
