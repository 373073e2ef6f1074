use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One selector entry, as it appears in a selector configuration file or in
/// the `selector_configs` override list of a selection request.
///
/// `class_name` is the unique identifier that must match a registered
/// selector implementation. Everything else is presentation or tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorDefinition {
    /// Unique selector class identifier. Files may spell this `class`.
    #[serde(alias = "class")]
    pub class_name: String,

    /// Optional display name. Read it through [`SelectorDefinition::display_alias`],
    /// which falls back to the class name when the file omitted one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Inactive definitions are parsed and kept but never executed.
    #[serde(default = "default_activate")]
    pub activate: bool,

    /// Free-form parameter map handed verbatim to the selector, which is the
    /// only party that knows how to interpret it.
    #[serde(default)]
    pub params: Map<String, Value>,
}

fn default_activate() -> bool {
    true
}

impl SelectorDefinition {
    /// A definition with no alias, no parameters, and activation on.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            alias: None,
            activate: true,
            params: Map::new(),
        }
    }

    /// The display name shown in responses and result files.
    pub fn display_alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.class_name)
    }
}

/// The root structure of a selector configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorFile {
    pub selectors: Vec<SelectorDefinition>,
}
