//! Theme resolution against a default design-token set.
//!
//! Top-level keys of `theme` replace a token category outright, keys under
//! `theme.extend` are merged into it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Design tokens by category (`colors`, `spacing`, ...)
pub type DesignTokens = IndexMap<String, Value>;

/// Theme configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Theme {
    /// Additive customizations
    #[serde(default)]
    pub extend: DesignTokens,

    /// Full replacements of a category
    #[serde(flatten)]
    pub overrides: DesignTokens,
}

impl Theme {
    /// True when the theme changes nothing
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty() && self.extend.values().all(is_empty_value)
    }

    /// Apply this theme on top of `defaults`
    pub fn resolve(&self, defaults: &DesignTokens) -> DesignTokens {
        let mut tokens = defaults.clone();

        for (category, value) in &self.overrides {
            tokens.insert(category.clone(), value.clone());
        }

        for (category, extension) in &self.extend {
            match tokens.get_mut(category) {
                Some(existing) => deep_merge(existing, extension),
                None => {
                    tokens.insert(category.clone(), extension.clone());
                }
            }
        }

        tokens
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Null => true,
        _ => false,
    }
}

/// Objects merge key by key; anything else is replaced
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}
