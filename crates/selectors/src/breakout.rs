use crate::Selector;
use crate::error::SelectorError;
use core_types::{Selection, UniverseSnapshot};
use rust_decimal::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use ta::Next;
use ta::indicators::Maximum;

/// Parameters for the breakout selector.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreakoutParams {
    /// Length of the prior-high window the close must clear.
    pub window: usize,
    /// Minimum bar count an instrument needs to be considered. Defaults to
    /// `window + 1` (the window plus the breakout bar itself).
    pub min_history: Option<usize>,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self {
            window: 20,
            min_history: None,
        }
    }
}

/// Selects instruments whose close on the trade date clears the highest high
/// of the preceding window. Unlike the momentum selector there is no fixed
/// pick count; every instrument that breaks out is selected.
#[derive(Debug)]
pub struct BreakoutSelector {
    window: usize,
    min_history: usize,
}

impl BreakoutSelector {
    pub const CLASS_NAME: &'static str = "Breakout";

    /// Creates a new `BreakoutSelector`, validating that the parameters are logical.
    pub fn new(params: BreakoutParams) -> Result<Self, SelectorError> {
        if params.window == 0 {
            return Err(SelectorError::InvalidParameters(
                "window must be at least 1".to_string(),
            ));
        }
        let min_history = params.min_history.unwrap_or(params.window + 1);
        if min_history < params.window + 1 {
            return Err(SelectorError::InvalidParameters(
                "min_history must cover the window plus the breakout bar".to_string(),
            ));
        }

        Ok(Self {
            window: params.window,
            min_history,
        })
    }

    /// Builds the selector from a raw configuration parameter map.
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, SelectorError> {
        let parsed: BreakoutParams = serde_json::from_value(Value::Object(params.clone()))
            .map_err(|e| SelectorError::InvalidParameters(e.to_string()))?;
        Self::new(parsed)
    }
}

impl Selector for BreakoutSelector {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn description(&self) -> &'static str {
        "Selects instruments whose close clears the highest high of the preceding window"
    }

    fn evaluate(&self, snapshot: &UniverseSnapshot) -> Result<Selection, SelectorError> {
        let mut scored: Vec<(String, f64)> = Vec::new();

        for (ticker, bars) in &snapshot.series {
            if bars.len() < self.min_history {
                continue;
            }
            let Some((last, prior)) = bars.split_last() else {
                continue;
            };
            if last.date != snapshot.trade_date {
                continue;
            }

            let mut highest = Maximum::new(self.window)
                .map_err(|e| SelectorError::IndicatorError(e.to_string()))?;
            let mut prior_high = 0.0;
            // min_history guarantees prior covers at least one full window.
            for bar in &prior[prior.len() - self.window..] {
                prior_high = highest.next(bar.high.to_f64().unwrap_or(0.0));
            }
            if prior_high <= 0.0 {
                continue;
            }

            let close = last.close.to_f64().unwrap_or(0.0);
            let margin_pct = (close / prior_high - 1.0) * 100.0;
            scored.push((ticker.clone(), margin_pct));
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        let scores: BTreeMap<String, f64> = scored.iter().cloned().collect();
        let selected: Vec<String> = scored
            .into_iter()
            .filter(|(_, margin)| *margin > 0.0)
            .map(|(ticker, _)| ticker)
            .collect();

        tracing::debug!(
            breakouts = selected.len(),
            window = self.window,
            "Breakout: scan complete"
        );

        Ok(Selection { selected, scores })
    }
}
