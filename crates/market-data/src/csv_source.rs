use crate::DataSource;
use crate::error::DataError;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{Bar, UniverseSnapshot};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A data source backed by a directory of per-instrument CSV files.
///
/// Each `<TICKER>.csv` holds daily bars as `date,open,high,low,close,volume`
/// rows, with an optional header line. Row order inside a file does not
/// matter; bars are sorted by date after parsing. A malformed row fails the
/// whole operation rather than silently shrinking the universe.
pub struct CsvDataSource {
    root: PathBuf,
}

impl CsvDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Lists `(ticker, path)` pairs for every `.csv` file in the data
    /// directory, sorted by ticker for deterministic iteration.
    async fn scan(&self) -> Result<Vec<(String, PathBuf)>, DataError> {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
                continue;
            }
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) if !stem.is_empty() => files.push((stem.to_string(), path)),
                _ => {
                    tracing::debug!(path = %path.display(), "Skipping data file with unusable name")
                }
            }
        }
        files.sort();
        Ok(files)
    }

    async fn parse_file(&self, path: &Path) -> Result<Vec<Bar>, DataError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let file = path.display().to_string();

        let mut bars = Vec::new();
        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            // Tolerate a conventional header row.
            if idx == 0 && line.to_ascii_lowercase().starts_with("date") {
                continue;
            }
            bars.push(parse_row(&file, idx + 1, line)?);
        }
        bars.sort_by_key(|bar| bar.date);
        Ok(bars)
    }
}

fn parse_row(file: &str, line: usize, row: &str) -> Result<Bar, DataError> {
    let fields: Vec<&str> = row.split(',').map(str::trim).collect();
    if fields.len() != 6 {
        return Err(DataError::Parse {
            file: file.to_string(),
            line,
            reason: format!("expected 6 columns, found {}", fields.len()),
        });
    }

    let date = NaiveDate::parse_from_str(fields[0], "%Y-%m-%d").map_err(|e| DataError::Parse {
        file: file.to_string(),
        line,
        reason: format!("bad date '{}': {}", fields[0], e),
    })?;

    Ok(Bar {
        date,
        open: parse_decimal(file, line, "open", fields[1])?,
        high: parse_decimal(file, line, "high", fields[2])?,
        low: parse_decimal(file, line, "low", fields[3])?,
        close: parse_decimal(file, line, "close", fields[4])?,
        volume: parse_decimal(file, line, "volume", fields[5])?,
    })
}

fn parse_decimal(file: &str, line: usize, name: &str, raw: &str) -> Result<Decimal, DataError> {
    Decimal::from_str(raw).map_err(|e| DataError::Parse {
        file: file.to_string(),
        line,
        reason: format!("bad {name} value '{raw}': {e}"),
    })
}

#[async_trait]
impl DataSource for CsvDataSource {
    async fn latest_date(&self) -> Result<Option<NaiveDate>, DataError> {
        let mut latest = None;
        for (_, path) in self.scan().await? {
            if let Some(last) = self.parse_file(&path).await?.last() {
                latest = latest.max(Some(last.date));
            }
        }
        Ok(latest)
    }

    async fn tickers_on(&self, date: NaiveDate) -> Result<Vec<String>, DataError> {
        let mut tickers = Vec::new();
        for (ticker, path) in self.scan().await? {
            let bars = self.parse_file(&path).await?;
            if bars.iter().any(|bar| bar.date == date) {
                tickers.push(ticker);
            }
        }
        Ok(tickers)
    }

    async fn load_snapshot(
        &self,
        date: NaiveDate,
        tickers: &[String],
    ) -> Result<UniverseSnapshot, DataError> {
        let wanted: HashSet<&str> = tickers.iter().map(String::as_str).collect();

        let mut series = BTreeMap::new();
        for (ticker, path) in self.scan().await? {
            if !wanted.contains(ticker.as_str()) {
                continue;
            }
            let mut bars = self.parse_file(&path).await?;
            bars.retain(|bar| bar.date <= date);
            if !bars.is_empty() {
                series.insert(ticker, bars);
            }
        }

        Ok(UniverseSnapshot {
            trade_date: date,
            series,
        })
    }
}
