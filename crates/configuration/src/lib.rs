//! # Sift Configuration
//!
//! This crate handles loading and validating selector configuration files for
//! the Sift system.
//!
//! ## Architectural Principles
//!
//! - **Explicit Over Ambient:** Configuration is loaded into a value and passed
//!   to whoever needs it. There is no process-wide config singleton; reloading
//!   means loading a fresh value, never mutating one in place.
//! - **Format Agnostic:** Selector files may be JSON or TOML; the `config`
//!   crate picks the parser from the file extension.
//!
//! ## Public API
//!
//! - `SelectorDefinition`: one configured selector entry.
//! - `load_selector_file`: reads and validates a selector file.
//! - `ConfigError`: everything that can go wrong while doing so.

use std::collections::HashSet;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{SelectorDefinition, SelectorFile};

/// Loads an ordered list of selector definitions from a JSON or TOML file.
///
/// The file must contain a top-level `selectors` list. Order is preserved:
/// results are later reported in the order definitions appear here. Duplicate
/// `class_name` entries are rejected because the request-override merge keys
/// on class name and a duplicate would make that merge ambiguous.
pub fn load_selector_file(path: &Path) -> Result<Vec<SelectorDefinition>, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .build()?;

    let file = builder.try_deserialize::<SelectorFile>()?;
    validate(&file.selectors)?;

    Ok(file.selectors)
}

fn validate(definitions: &[SelectorDefinition]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for def in definitions {
        if def.class_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "selector entry has an empty class_name".to_string(),
            ));
        }
        if !seen.insert(def.class_name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate selector class '{}' in configuration file",
                def.class_name
            )));
        }
    }
    Ok(())
}
