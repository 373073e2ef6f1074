use crate::Selector;
use crate::catalog::SelectorCatalog;
use configuration::{ConfigError, SelectorDefinition};
use std::path::Path;
use std::sync::Arc;

/// One activated selector, constructed and ready to evaluate, paired with
/// the definition that produced it.
#[derive(Debug)]
pub struct ActiveSelector {
    pub definition: SelectorDefinition,
    pub selector: Arc<dyn Selector>,
}

/// An ordered set of selector definitions validated against a catalog.
///
/// A registry is a plain value built per request or per process start.
/// Reloading configuration means constructing a fresh registry; nothing here
/// is ever mutated in place or shared mutably.
#[derive(Debug)]
pub struct SelectorRegistry {
    catalog: SelectorCatalog,
    definitions: Vec<SelectorDefinition>,
}

impl SelectorRegistry {
    /// Builds a registry from already-parsed definitions, rejecting any that
    /// name a class the catalog does not know. Inactive definitions are
    /// name-checked too; a config file should not rot just because an entry
    /// is currently switched off.
    pub fn new(
        catalog: SelectorCatalog,
        definitions: Vec<SelectorDefinition>,
    ) -> Result<Self, ConfigError> {
        for definition in &definitions {
            if !catalog.contains(&definition.class_name) {
                return Err(ConfigError::UnknownSelector(definition.class_name.clone()));
            }
        }
        Ok(Self {
            catalog,
            definitions,
        })
    }

    /// Loads base definitions from a selector file and validates them.
    pub fn load(catalog: SelectorCatalog, config_path: &Path) -> Result<Self, ConfigError> {
        let definitions = configuration::load_selector_file(config_path)?;
        Self::new(catalog, definitions)
    }

    pub fn definitions(&self) -> &[SelectorDefinition] {
        &self.definitions
    }

    /// Merges request-supplied overrides over the base definitions.
    ///
    /// Matching is by class name and replacement is whole-entry: an override
    /// brings its complete parameter set, nothing is merged field by field.
    /// Overrides naming classes absent from the base are appended after it,
    /// in their own order.
    pub fn resolve(
        &self,
        overrides: Option<&[SelectorDefinition]>,
    ) -> Result<Vec<SelectorDefinition>, ConfigError> {
        let Some(overrides) = overrides else {
            return Ok(self.definitions.clone());
        };
        for over in overrides {
            if !self.catalog.contains(&over.class_name) {
                return Err(ConfigError::UnknownSelector(over.class_name.clone()));
            }
        }

        let mut resolved = self.definitions.clone();
        for over in overrides {
            match resolved
                .iter_mut()
                .find(|def| def.class_name == over.class_name)
            {
                Some(slot) => *slot = over.clone(),
                None => resolved.push(over.clone()),
            }
        }
        Ok(resolved)
    }

    /// Resolves overrides, drops inactive definitions, and constructs each
    /// remaining selector. Parameter validation happens here, so a
    /// misconfigured request fails before anything is evaluated.
    pub fn activated(
        &self,
        overrides: Option<&[SelectorDefinition]>,
    ) -> Result<Vec<ActiveSelector>, ConfigError> {
        let mut active = Vec::new();
        for definition in self.resolve(overrides)? {
            if !definition.activate {
                continue;
            }
            let selector = self.catalog.build(&definition)?;
            active.push(ActiveSelector {
                definition,
                selector,
            });
        }
        Ok(active)
    }
}
