//! # Sift Market Data
//!
//! This crate is the system's window onto raw market data. It defines the
//! `DataSource` capability the rest of the application consumes and ships a
//! filesystem-backed implementation of it.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Adapter:** Nothing above this crate knows what a data file
//!   looks like. The core consumes `Bar`s and `UniverseSnapshot`s; file
//!   formats and directory layout are private to the implementations here.
//! - **Capability, Not Implementation:** Orchestration code holds a
//!   `dyn DataSource`, so the CSV directory backing can be swapped for a
//!   database or feed without touching any caller.
//!
//! ## Public API
//!
//! - `DataSource`: the async capability trait.
//! - `CsvDataSource`: directory-of-CSV-files implementation.
//! - `resolve_trade_date` / `resolve_universe`: turn a request's optional
//!   date and ticker list into concrete values.
//! - `DataError`: everything that can go wrong while doing so.

use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::UniverseSnapshot;

// Declare the modules that constitute this crate.
pub mod csv_source;
pub mod error;
pub mod resolve;

// Re-export the key components to create a clean, public-facing API.
pub use csv_source::CsvDataSource;
pub use error::DataError;
pub use resolve::{resolve_trade_date, resolve_universe};

/// The capability the selection system consumes market data through.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call
/// concurrently; the service holds one instance for its whole lifetime.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// The most recent date any instrument has data for, or `None` when the
    /// source is completely empty.
    async fn latest_date(&self) -> Result<Option<NaiveDate>, DataError>;

    /// Tickers that have a bar exactly on `date`, sorted ascending.
    async fn tickers_on(&self, date: NaiveDate) -> Result<Vec<String>, DataError>;

    /// Builds the evaluation snapshot for `date`: for each requested ticker,
    /// its full history up to and including `date`. Tickers with no bars in
    /// that range are simply absent from the snapshot.
    async fn load_snapshot(
        &self,
        date: NaiveDate,
        tickers: &[String],
    ) -> Result<UniverseSnapshot, DataError>;
}
