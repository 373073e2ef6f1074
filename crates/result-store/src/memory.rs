use crate::ResultStore;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{CacheKey, SelectionResult};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// An in-memory result store.
///
/// Entries live in a sorted map, so the listing order the filesystem store
/// produces by sorting falls out of iteration order here. Useful for tests
/// and for running the service without durability.
#[derive(Default)]
pub struct MemoryResultStore {
    entries: RwLock<BTreeMap<CacheKey, SelectionResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<SelectionResult>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put_atomic(&self, key: &CacheKey, result: &SelectionResult) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.clone(), result.clone());
        Ok(())
    }

    async fn list_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let entries = self.entries.read().await;
        let mut dates: Vec<NaiveDate> = entries.keys().map(|key| key.trade_date).collect();
        dates.dedup();
        dates.reverse();
        Ok(dates)
    }

    async fn keys_for_date(&self, date: NaiveDate) -> Result<Vec<CacheKey>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .keys()
            .filter(|key| key.trade_date == date)
            .cloned()
            .collect())
    }
}
