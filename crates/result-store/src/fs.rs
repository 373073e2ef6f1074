use crate::ResultStore;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{CacheKey, SelectionResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The filesystem result store: one directory per trade date, one JSON
/// document per selector inside it.
///
/// ```text
/// result/
///   2025-01-15/
///     Momentum.json
///     Breakout.json
///   2025-01-16/
///     Momentum.json
/// ```
///
/// Publishes go through a uniquely named temporary file in the target
/// directory followed by a rename, so a reader never observes a partially
/// written document and concurrent writers of the same key cannot trample
/// each other's temp files.
pub struct FsResultStore {
    root: PathBuf,
}

impl FsResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(key.trade_date.format(DATE_FORMAT).to_string())
            .join(format!("{}.json", key.selector))
    }
}

#[async_trait]
impl ResultStore for FsResultStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<SelectionResult>, StoreError> {
        let path = self.entry_path(key);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let result: SelectionResult = serde_json::from_str(&contents)?;
        if !result.is_consistent() {
            return Err(StoreError::Corrupt(
                key.clone(),
                format!(
                    "count field says {} but {} tickers are selected",
                    result.count,
                    result.selected.len()
                ),
            ));
        }
        Ok(Some(result))
    }

    async fn put_atomic(&self, key: &CacheKey, result: &SelectionResult) -> Result<(), StoreError> {
        let final_path = self.entry_path(key);
        // entry_path always has a parent: root/date/selector.json.
        let dir = final_path.parent().unwrap_or(&self.root).to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;

        let tmp_path = dir.join(format!(".{}.json.{}.tmp", key.selector, Uuid::new_v4()));
        let body = serde_json::to_vec_pretty(result)?;

        tokio::fs::write(&tmp_path, &body).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!(key = %key, path = %final_path.display(), "Published result entry");
        Ok(())
    }

    async fn list_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            // Directories that are not date-named are someone else's business.
            if let Some(date) = name
                .to_str()
                .and_then(|n| NaiveDate::parse_from_str(n, DATE_FORMAT).ok())
            {
                dates.push(date);
            }
        }

        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    async fn keys_for_date(&self, date: NaiveDate) -> Result<Vec<CacheKey>, StoreError> {
        let dir = self.root.join(date.format(DATE_FORMAT).to_string());
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(selector) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(CacheKey::new(date, selector));
            }
        }

        keys.sort_unstable();
        Ok(keys)
    }
}
