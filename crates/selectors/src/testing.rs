//! Snapshot builders shared by the selector unit tests.

use chrono::{Days, NaiveDate};
use core_types::{Bar, UniverseSnapshot};
use rust_decimal::prelude::*;
use std::collections::BTreeMap;

/// A snapshot where each instrument's closes (and highs) follow the given
/// values on consecutive days ending at `trade_date`. Volume is constant.
pub fn snapshot_of_closes(trade_date: &str, series: &[(&str, &[f64])]) -> UniverseSnapshot {
    build(trade_date, series, false)
}

/// A snapshot where each instrument's volumes follow the given values on
/// consecutive days ending at `trade_date`. Prices are constant.
pub fn snapshot_of_volumes(trade_date: &str, series: &[(&str, &[f64])]) -> UniverseSnapshot {
    build(trade_date, series, true)
}

fn build(trade_date: &str, series: &[(&str, &[f64])], values_are_volume: bool) -> UniverseSnapshot {
    let trade_date: NaiveDate = trade_date.parse().unwrap();

    let mut map = BTreeMap::new();
    for (ticker, values) in series {
        let start = trade_date - Days::new((values.len() - 1) as u64);
        let bars = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let value = Decimal::from_f64(*value).unwrap();
                let (price, volume) = if values_are_volume {
                    (Decimal::TEN, value)
                } else {
                    (value, Decimal::ONE_THOUSAND)
                };
                Bar {
                    date: start + Days::new(i as u64),
                    open: price,
                    high: price,
                    low: price,
                    close: price,
                    volume,
                }
            })
            .collect();
        map.insert(ticker.to_string(), bars);
    }

    UniverseSnapshot {
        trade_date,
        series: map,
    }
}
