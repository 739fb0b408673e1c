//! Process-wide properties.
//!
//! Environment-based password sources consult these properties before the
//! process environment. Launchers set them from command-line switches.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;

static PROPERTIES: LazyLock<RwLock<HashMap<String, String>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Sets a property, returning the previous value.
pub fn set_property(key: impl Into<String>, value: impl Into<String>) -> Option<String> {
    PROPERTIES.write().insert(key.into(), value.into())
}

/// Reads a property.
pub fn property(key: &str) -> Option<String> {
    PROPERTIES.read().get(key).cloned()
}

/// Removes a property.
pub fn remove_property(key: &str) -> Option<String> {
    PROPERTIES.write().remove(key)
}
