//! Scope Options
//!
//! Process-wide settings, fixed when the scoping service is created.

use serde::Deserialize;

use crate::error::Result;
use crate::host::MarkerMode;

pub const DEFAULT_PREFIX: &str = "__scoped_";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopeOptions {
    /// Mark the scope element with a class instead of an attribute.
    pub apply_to_class: bool,
    /// Naming prefix of generated markers; a counter is appended.
    pub prefix: String,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        ScopeOptions {
            apply_to_class: false,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl ScopeOptions {
    /// Options from a JSON object such as `{"applyToClass": true}`. Missing
    /// keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn marker_mode(&self) -> MarkerMode {
        if self.apply_to_class {
            MarkerMode::Class
        } else {
            MarkerMode::Attribute
        }
    }

    /// Marker name for the `id`-th scoped resource.
    pub fn marker_name(&self, id: u64) -> String {
        format!("{}{}", self.prefix, id)
    }
}
