//! # Sift Selector Library
//!
//! This crate contains the selection logic for the Sift system. It defines a
//! universal `Selector` trait, a catalog of constructors keyed by class name,
//! and several concrete selector implementations.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   storage, caching, or transports. It depends only on `core-types` and
//!   `configuration`.
//! - **Selector Agnostic Engine:** Through the `Selector` trait, the engine
//!   can orchestrate any selector without knowing its internals.
//! - **Fail Fast:** Class names and parameters are validated when a registry
//!   is built, never lazily at first evaluation.
//! - **Extensibility:** Adding a selector means implementing the trait and
//!   registering a constructor in the catalog.
//!
//! ## Public API
//!
//! - `Selector`: the core trait all selectors implement.
//! - `SelectorCatalog`: the class-name-to-constructor table.
//! - `SelectorRegistry`: validated, override-aware configuration resolution.
//! - The concrete selector structs themselves (e.g. `MomentumSelector`).

use core_types::{Selection, UniverseSnapshot};

// Declare all the modules that constitute this crate.
pub mod breakout;
pub mod catalog;
pub mod error;
pub mod momentum;
pub mod registry;
pub mod volume_surge;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the key components to create a clean, public-facing API.
pub use breakout::{BreakoutParams, BreakoutSelector};
pub use catalog::{BuildFn, SelectorCatalog};
pub use error::SelectorError;
pub use momentum::{MomentumParams, MomentumSelector};
pub use registry::{ActiveSelector, SelectorRegistry};
pub use volume_surge::{VolumeSurgeParams, VolumeSurgeSelector};

/// The core trait all selectors implement.
///
/// `evaluate` is a pure function of the snapshot and the selector's own
/// parameters. That purity is what allows results to be cached by
/// (date, class name) alone and shared between identical requests. The
/// `Send + Sync` bounds allow one built instance to be evaluated from any
/// worker thread.
pub trait Selector: Send + Sync + std::fmt::Debug {
    /// Unique class identifier, matching configuration `class_name`.
    fn class_name(&self) -> &'static str;

    /// One-line human description for listings.
    fn description(&self) -> &'static str;

    /// Evaluates the universe snapshot into picks and scores.
    ///
    /// # Returns
    ///
    /// * `Ok(Selection)` - the selected tickers, in rank order, plus scores
    ///   for everything the selector considered.
    /// * `Err(SelectorError)` - if evaluation failed; the orchestrator
    ///   reports this per selector without aborting its siblings.
    fn evaluate(&self, snapshot: &UniverseSnapshot) -> Result<Selection, SelectorError>;
}
