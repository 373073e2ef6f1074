use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single daily row of market data for one instrument.
///
/// The data layer owns the file format these come from; the rest of the
/// system only ever sees this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// The per-request view of the market: every candidate instrument's history
/// up to and including the trade date.
///
/// Built once per request by the data layer and shared read-only by every
/// selector evaluated for that request.
#[derive(Debug, Clone)]
pub struct UniverseSnapshot {
    pub trade_date: NaiveDate,
    /// Ticker -> bars, ascending by date, truncated at `trade_date`.
    pub series: BTreeMap<String, Vec<Bar>>,
}

impl UniverseSnapshot {
    /// The bars for one ticker, if the snapshot holds any.
    pub fn history(&self, ticker: &str) -> Option<&[Bar]> {
        self.series.get(ticker).map(Vec::as_slice)
    }

    /// Tickers present in the snapshot, in lexicographic order.
    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// The raw output of one selector run: the picks, plus whatever scores the
/// selector assigned while ranking. Scored-but-unselected instruments are
/// allowed; every selected ticker should carry a score where the strategy
/// produces one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub selected: Vec<String>,
    pub scores: BTreeMap<String, f64>,
}

/// The immutable outcome of running one selector for one trade date. This is
/// exactly what the durable store persists and the query surface returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// The selector's unique class name (the cache key component).
    pub selector_name: String,
    /// The display name from configuration.
    pub alias: String,
    pub trade_date: NaiveDate,
    /// Selected tickers, in the selector's own ranking order.
    pub selected: Vec<String>,
    /// Per-ticker scores, possibly covering unselected instruments.
    pub scores: BTreeMap<String, f64>,
    /// Always `selected.len()`; derived at construction and re-checked when
    /// an entry is read back from the durable store.
    pub count: usize,
}

impl SelectionResult {
    /// Assembles a result from a selector's raw output. `count` is derived
    /// here so it cannot disagree with `selected`.
    pub fn new(
        selector_name: impl Into<String>,
        alias: impl Into<String>,
        trade_date: NaiveDate,
        selection: Selection,
    ) -> Self {
        let count = selection.selected.len();
        Self {
            selector_name: selector_name.into(),
            alias: alias.into(),
            trade_date,
            selected: selection.selected,
            scores: selection.scores,
            count,
        }
    }

    /// True when the derived-field invariant holds. Results are produced by
    /// [`SelectionResult::new`], so a mismatch on read means the durable
    /// entry was edited or corrupted outside the service.
    pub fn is_consistent(&self) -> bool {
        self.count == self.selected.len()
    }
}
