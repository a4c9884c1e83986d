//! Registry of widget types

use crate::error::FormError;
use crate::widget::{BoxedWidget, WidgetCx};
use once_cell::sync::Lazy;
use semform_types::Field;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Function that constructs a widget for a field and its current params
pub type WidgetFactory =
    fn(&mut WidgetCx<'_>, Field, Option<Value>) -> Result<BoxedWidget, FormError>;

/// A registered widget implementation
#[derive(Clone, Copy)]
pub struct WidgetType {
    pub construct: WidgetFactory,
    /// Schema attributes this widget reads as references to other fields.
    /// A `default` listed here is never written into params as a literal.
    pub reference_attrs: &'static [&'static str],
}

impl WidgetType {
    pub const fn new(construct: WidgetFactory) -> Self {
        Self {
            construct,
            reference_attrs: &[],
        }
    }

    pub const fn with_references(mut self, attrs: &'static [&'static str]) -> Self {
        self.reference_attrs = attrs;
        self
    }

    pub fn is_reference(&self, attr: &str) -> bool {
        self.reference_attrs.contains(&attr)
    }
}

impl std::fmt::Debug for WidgetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetType")
            .field("reference_attrs", &self.reference_attrs)
            .finish()
    }
}

/// Registry mapping widget names to widget types
///
/// Built-in widgets are registered at start-up; integrators may add their
/// own under new names or replace existing ones.
#[derive(Clone, Default, Debug)]
pub struct Registry {
    widgets: HashMap<String, WidgetType>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a widget type, replacing any previous one with the same name
    pub fn register(&mut self, name: &str, widget: WidgetType) {
        if self.widgets.insert(name.to_string(), widget).is_some() {
            log::debug!("Replaced widget type {}", name);
        }
    }

    /// Look up a widget type by name
    pub fn resolve(&self, name: &str) -> Option<WidgetType> {
        self.widgets.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.widgets.contains_key(name)
    }

    /// List all registered widget names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.widgets.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn clear(&mut self) {
        self.widgets.clear();
    }
}

/// Global registry instance
static GLOBAL_REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::new()));

/// Register a widget type in the global registry
pub fn register(name: &str, widget: WidgetType) {
    let mut registry = GLOBAL_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.register(name, widget);
}

/// Look up a widget type in the global registry
pub fn resolve(name: &str) -> Option<WidgetType> {
    let registry = GLOBAL_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.resolve(name)
}

/// Snapshot of the global registry; forms keep the one taken at creation
pub fn global_registry() -> Registry {
    GLOBAL_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Forget every globally registered widget type
pub fn reset_registry() {
    GLOBAL_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Stub;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = Registry::new();
        assert!(registry.resolve("stub").is_none());

        registry.register("stub", WidgetType::new(Stub::construct));
        registry.register(
            "follower",
            WidgetType::new(Stub::construct).with_references(&["max", "default"]),
        );

        assert!(registry.contains("stub"));
        assert_eq!(registry.list(), vec!["follower", "stub"]);
        assert!(registry.resolve("follower").unwrap().is_reference("default"));
        assert!(!registry.resolve("stub").unwrap().is_reference("default"));

        registry.clear();
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_global_snapshot_is_detached() {
        register("core-test-stub", WidgetType::new(Stub::construct));
        let snapshot = global_registry();
        assert!(snapshot.contains("core-test-stub"));
        assert!(resolve("core-test-stub").is_some());

        // later registrations do not leak into an existing snapshot
        register("core-test-late", WidgetType::new(Stub::construct).with_references(&["max"]));
        assert!(!snapshot.contains("core-test-late"));
        assert!(resolve("core-test-late").unwrap().is_reference("max"));

        reset_registry();
        assert!(resolve("core-test-stub").is_none());
        assert!(snapshot.contains("core-test-stub"));
    }
}
