use crate::Selector;
use crate::error::SelectorError;
use core_types::{Selection, UniverseSnapshot};
use rust_decimal::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use ta::Next;
use ta::indicators::RateOfChange as Roc;

/// Parameters for the momentum selector.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MomentumParams {
    /// How many bars back the rate-of-change compares against.
    pub lookback: usize,
    /// How many of the strongest instruments to keep.
    pub top_n: usize,
    /// Minimum bar count an instrument needs to be considered. Defaults to
    /// `lookback + 1` so the indicator is fully warmed up.
    pub min_history: Option<usize>,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            lookback: 20,
            top_n: 10,
            min_history: None,
        }
    }
}

/// Ranks the universe by percentage rate-of-change over a lookback window and
/// selects the strongest movers.
#[derive(Debug)]
pub struct MomentumSelector {
    lookback: usize,
    top_n: usize,
    min_history: usize,
}

impl MomentumSelector {
    pub const CLASS_NAME: &'static str = "Momentum";

    /// Creates a new `MomentumSelector`, validating that the parameters are logical.
    pub fn new(params: MomentumParams) -> Result<Self, SelectorError> {
        if params.lookback == 0 {
            return Err(SelectorError::InvalidParameters(
                "lookback must be at least 1".to_string(),
            ));
        }
        if params.top_n == 0 {
            return Err(SelectorError::InvalidParameters(
                "top_n must be at least 1".to_string(),
            ));
        }
        let min_history = params.min_history.unwrap_or(params.lookback + 1);
        if min_history < 2 {
            return Err(SelectorError::InvalidParameters(
                "min_history must be at least 2".to_string(),
            ));
        }

        Ok(Self {
            lookback: params.lookback,
            top_n: params.top_n,
            min_history,
        })
    }

    /// Builds the selector from a raw configuration parameter map.
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, SelectorError> {
        let parsed: MomentumParams = serde_json::from_value(Value::Object(params.clone()))
            .map_err(|e| SelectorError::InvalidParameters(e.to_string()))?;
        Self::new(parsed)
    }
}

impl Selector for MomentumSelector {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn description(&self) -> &'static str {
        "Ranks instruments by rate-of-change over a lookback window and keeps the strongest movers"
    }

    fn evaluate(&self, snapshot: &UniverseSnapshot) -> Result<Selection, SelectorError> {
        let mut scored: Vec<(String, f64)> = Vec::new();

        for (ticker, bars) in &snapshot.series {
            if bars.len() < self.min_history {
                continue;
            }
            // Instruments without a bar on the trade date are stale and
            // excluded from ranking entirely.
            match bars.last() {
                Some(last) if last.date == snapshot.trade_date => {}
                _ => continue,
            }

            let mut roc = Roc::new(self.lookback)
                .map_err(|e| SelectorError::IndicatorError(e.to_string()))?;
            let mut momentum = 0.0;
            for bar in bars {
                // The `ta` crate uses `f64`. Converting from `Decimal` is a
                // controlled and accepted precision trade-off for using it.
                momentum = roc.next(bar.close.to_f64().unwrap_or(0.0));
            }
            scored.push((ticker.clone(), momentum));
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        tracing::debug!(
            evaluated = scored.len(),
            top_n = self.top_n,
            "Momentum: ranked universe"
        );

        let scores: BTreeMap<String, f64> = scored.iter().cloned().collect();
        let selected = scored
            .into_iter()
            .take(self.top_n)
            .map(|(ticker, _)| ticker)
            .collect();

        Ok(Selection { selected, scores })
    }
}
