//! # Sift Core Types
//!
//! This crate defines the value types shared across the Sift system: market
//! data rows, the per-request universe snapshot handed to selectors, and the
//! selection results the rest of the system caches and serves.
//!
//! ## Architectural Principles
//!
//! - **Layer 0:** This crate depends on nothing else in the workspace. Every
//!   other crate speaks these types.
//! - **Immutable values:** A `SelectionResult` is assembled once and never
//!   mutated afterwards; derived fields are computed at construction so they
//!   cannot drift out of sync.

// Declare the modules that constitute this crate.
pub mod key;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use key::CacheKey;
pub use structs::{Bar, Selection, SelectionResult, UniverseSnapshot};
