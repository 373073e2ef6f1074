//! # Sift Result Store
//!
//! This crate is the durable memory of the Sift system: every computed
//! selection result is stored here, keyed by `(trade date, selector)`, and
//! the cache layer guarantees each key is computed at most once at a time no
//! matter how many requests race for it.
//!
//! ## Architectural Principles
//!
//! - **Layer 2 Infrastructure:** Knows nothing about selectors or market
//!   data. It stores and retrieves `SelectionResult`s and runs opaque
//!   computations handed to it as futures.
//! - **Swappable Durability:** The cache algorithm is written against the
//!   `ResultStore` trait. The filesystem backend can be replaced by any
//!   store that can publish an entry atomically.
//! - **Atomic Publishes:** An entry is either fully visible or absent.
//!   Readers never see a half-written document, and a failed computation
//!   never leaves a durable trace.
//!
//! ## Public API
//!
//! - `ResultStore`: the durable-map capability trait.
//! - `FsResultStore` / `MemoryResultStore`: the shipping implementations.
//! - `ResultCache`: single-flight compute-once layer over a store.
//! - `StoreError` / `CacheError` / `EvalFailure`: the failure vocabulary.

use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{CacheKey, SelectionResult};

// Declare the modules that constitute this crate.
pub mod cache;
pub mod error;
pub mod fs;
pub mod memory;

// Re-export the key components to create a clean, public-facing API.
pub use cache::ResultCache;
pub use error::{CacheError, EvalFailure, StoreError};
pub use fs::FsResultStore;
pub use memory::MemoryResultStore;

/// A durable map from cache key to selection result.
///
/// Implementations must make `put_atomic` all-or-nothing per entry: a
/// concurrent reader sees either the previous entry, the new one, or none,
/// never a torn write. Nothing else about the backing medium leaks through
/// this trait.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Fetches the entry for a key, `None` when absent.
    async fn get(&self, key: &CacheKey) -> Result<Option<SelectionResult>, StoreError>;

    /// Publishes an entry in one atomic step, replacing any previous one.
    async fn put_atomic(&self, key: &CacheKey, result: &SelectionResult) -> Result<(), StoreError>;

    /// Dates with at least one entry, newest first.
    async fn list_dates(&self) -> Result<Vec<NaiveDate>, StoreError>;

    /// Every key stored for a date, ordered by selector name. An unknown
    /// date is an empty list, not an error.
    async fn keys_for_date(&self, date: NaiveDate) -> Result<Vec<CacheKey>, StoreError>;
}
