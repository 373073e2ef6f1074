use crate::error::SelectorError;
use crate::{BreakoutSelector, MomentumSelector, Selector, VolumeSurgeSelector};
use configuration::{ConfigError, SelectorDefinition};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Constructor signature every catalog entry provides.
pub type BuildFn = fn(&Map<String, Value>) -> Result<Box<dyn Selector>, SelectorError>;

/// The registration-time table mapping selector class names to constructors.
///
/// All dispatch by name goes through this table, so a configuration naming a
/// class nobody registered is rejected when the registry is built rather
/// than on first evaluation. Cloning copies a table of function pointers, so
/// handing each request its own catalog is cheap.
#[derive(Clone, Debug)]
pub struct SelectorCatalog {
    builders: BTreeMap<&'static str, BuildFn>,
}

impl SelectorCatalog {
    pub fn empty() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// The catalog holding every selector this crate ships.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.register(MomentumSelector::CLASS_NAME, |params| {
            Ok(Box::new(MomentumSelector::from_params(params)?))
        });
        catalog.register(BreakoutSelector::CLASS_NAME, |params| {
            Ok(Box::new(BreakoutSelector::from_params(params)?))
        });
        catalog.register(VolumeSurgeSelector::CLASS_NAME, |params| {
            Ok(Box::new(VolumeSurgeSelector::from_params(params)?))
        });
        catalog
    }

    /// Registers a constructor under a class name. Registering an existing
    /// name replaces the previous constructor.
    pub fn register(&mut self, class_name: &'static str, build: BuildFn) {
        self.builders.insert(class_name, build);
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.builders.contains_key(class_name)
    }

    /// Registered class names, sorted.
    pub fn class_names(&self) -> Vec<&'static str> {
        self.builders.keys().copied().collect()
    }

    /// Builds the selector a definition names. An unknown class and rejected
    /// parameters are both configuration faults, reported as such.
    pub fn build(&self, definition: &SelectorDefinition) -> Result<Arc<dyn Selector>, ConfigError> {
        let build = self
            .builders
            .get(definition.class_name.as_str())
            .ok_or_else(|| ConfigError::UnknownSelector(definition.class_name.clone()))?;

        let selector = build(&definition.params).map_err(|e| {
            ConfigError::ValidationError(format!("selector '{}': {}", definition.class_name, e))
        })?;
        Ok(Arc::from(selector))
    }
}
