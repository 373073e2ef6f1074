use crate::Selector;
use crate::error::SelectorError;
use core_types::{Selection, UniverseSnapshot};
use rust_decimal::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use ta::Next;
use ta::indicators::SimpleMovingAverage as Sma;

/// Parameters for the volume surge selector.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VolumeSurgeParams {
    /// Length of the trailing window the average volume is taken over.
    pub window: usize,
    /// How many times average volume the trade date must print to count as a surge.
    pub multiplier: f64,
    /// How many of the strongest surges to keep.
    pub top_n: usize,
}

impl Default for VolumeSurgeParams {
    fn default() -> Self {
        Self {
            window: 20,
            multiplier: 2.0,
            top_n: 10,
        }
    }
}

/// Selects instruments whose trade-date volume is a multiple of their own
/// trailing average, ranked by that ratio.
#[derive(Debug)]
pub struct VolumeSurgeSelector {
    window: usize,
    multiplier: f64,
    top_n: usize,
}

impl VolumeSurgeSelector {
    pub const CLASS_NAME: &'static str = "VolumeSurge";

    /// Creates a new `VolumeSurgeSelector`, validating that the parameters are logical.
    pub fn new(params: VolumeSurgeParams) -> Result<Self, SelectorError> {
        if params.window == 0 {
            return Err(SelectorError::InvalidParameters(
                "window must be at least 1".to_string(),
            ));
        }
        if params.top_n == 0 {
            return Err(SelectorError::InvalidParameters(
                "top_n must be at least 1".to_string(),
            ));
        }
        if !params.multiplier.is_finite() || params.multiplier <= 1.0 {
            return Err(SelectorError::InvalidParameters(
                "multiplier must be a finite value above 1.0".to_string(),
            ));
        }

        Ok(Self {
            window: params.window,
            multiplier: params.multiplier,
            top_n: params.top_n,
        })
    }

    /// Builds the selector from a raw configuration parameter map.
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, SelectorError> {
        let parsed: VolumeSurgeParams = serde_json::from_value(Value::Object(params.clone()))
            .map_err(|e| SelectorError::InvalidParameters(e.to_string()))?;
        Self::new(parsed)
    }
}

impl Selector for VolumeSurgeSelector {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn description(&self) -> &'static str {
        "Selects instruments trading at a multiple of their own trailing average volume"
    }

    fn evaluate(&self, snapshot: &UniverseSnapshot) -> Result<Selection, SelectorError> {
        let mut scored: Vec<(String, f64)> = Vec::new();

        for (ticker, bars) in &snapshot.series {
            // One full window of history plus the bar being judged.
            if bars.len() < self.window + 1 {
                continue;
            }
            let Some((last, prior)) = bars.split_last() else {
                continue;
            };
            if last.date != snapshot.trade_date {
                continue;
            }

            let mut average = Sma::new(self.window)
                .map_err(|e| SelectorError::IndicatorError(e.to_string()))?;
            let mut avg_volume = 0.0;
            for bar in &prior[prior.len() - self.window..] {
                avg_volume = average.next(bar.volume.to_f64().unwrap_or(0.0));
            }
            // A dormant instrument has no meaningful baseline.
            if avg_volume <= 0.0 {
                continue;
            }

            let ratio = last.volume.to_f64().unwrap_or(0.0) / avg_volume;
            scored.push((ticker.clone(), ratio));
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        let scores: BTreeMap<String, f64> = scored.iter().cloned().collect();
        let selected: Vec<String> = scored
            .into_iter()
            .filter(|(_, ratio)| *ratio >= self.multiplier)
            .take(self.top_n)
            .map(|(ticker, _)| ticker)
            .collect();

        tracing::debug!(
            surges = selected.len(),
            multiplier = self.multiplier,
            "VolumeSurge: scan complete"
        );

        Ok(Selection { selected, scores })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::snapshot_of_volumes;

    fn selector(window: usize, multiplier: f64, top_n: usize) -> VolumeSurgeSelector {
        VolumeSurgeSelector::new(VolumeSurgeParams {
            window,
            multiplier,
            top_n,
        })
        .unwrap()
    }

    #[test]
    fn selects_volume_at_a_multiple_of_trailing_average() {
        let snapshot = snapshot_of_volumes(
            "2025-01-15",
            &[
                ("SURGE", &[100.0, 100.0, 100.0, 350.0]),
                ("QUIET", &[100.0, 100.0, 100.0, 110.0]),
            ],
        );

        let selection = selector(3, 2.0, 10).evaluate(&snapshot).unwrap();

        assert_eq!(selection.selected, vec!["SURGE"]);
        assert!((selection.scores["SURGE"] - 3.5).abs() < 1e-9);
        assert!(selection.scores["QUIET"] < 2.0);
    }

    #[test]
    fn caps_surges_at_top_n() {
        let snapshot = snapshot_of_volumes(
            "2025-01-15",
            &[
                ("A", &[100.0, 100.0, 100.0, 300.0]),
                ("B", &[100.0, 100.0, 100.0, 500.0]),
                ("C", &[100.0, 100.0, 100.0, 400.0]),
            ],
        );

        let selection = selector(3, 2.0, 2).evaluate(&snapshot).unwrap();

        assert_eq!(selection.selected, vec!["B", "C"]);
        assert_eq!(selection.scores.len(), 3);
    }

    #[test]
    fn dormant_instruments_are_skipped() {
        let snapshot = snapshot_of_volumes("2025-01-15", &[("DEAD", &[0.0, 0.0, 0.0, 500.0])]);

        let selection = selector(3, 2.0, 10).evaluate(&snapshot).unwrap();

        assert!(selection.selected.is_empty());
        assert!(selection.scores.is_empty());
    }

    #[test]
    fn rejects_multiplier_at_or_below_one() {
        let err = VolumeSurgeSelector::new(VolumeSurgeParams {
            window: 20,
            multiplier: 1.0,
            top_n: 10,
        })
        .unwrap_err();
        assert!(matches!(err, SelectorError::InvalidParameters(_)));
    }
}
