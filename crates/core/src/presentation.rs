//! Retained presentation tree
//!
//! Widgets describe what they show as [`Element`]s placed in mount points;
//! integrators walk this and map it onto a real toolkit.

use crate::tree::WidgetId;
use std::collections::HashMap;

/// Where an element is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mount {
    /// Top level of the form
    Root,
    /// Content area of a composite widget
    Content(WidgetId),
    /// Dialog owned by a widget (e.g. a file's copyright form)
    Dialog(WidgetId),
}

impl Mount {
    /// Widget owning this mount point, if any
    pub fn owner(&self) -> Option<WidgetId> {
        match self {
            Mount::Root => None,
            Mount::Content(id) | Mount::Dialog(id) => Some(*id),
        }
    }
}

/// Visible state of one widget
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub widget: WidgetId,
    /// Space separated classes, e.g. "field text"
    pub class: String,
    pub label: String,
    pub description: Option<String>,
    /// Title bar text of collapsible groups
    pub title: Option<String>,
    pub expanded: bool,
    /// An operation (upload) is in flight
    pub busy: bool,
}

impl Element {
    pub fn new(widget: WidgetId, class: impl Into<String>) -> Self {
        Self {
            widget,
            class: class.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class.split_whitespace().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            if !self.class.is_empty() {
                self.class.push(' ');
            }
            self.class.push_str(class);
        }
    }
}

#[derive(Debug, Default)]
pub struct Presentation {
    mounts: HashMap<Mount, Vec<Element>>,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element, replacing the widget's element if it is already
    /// mounted there
    pub fn mount(&mut self, mount: Mount, element: Element) {
        let elements = self.mounts.entry(mount).or_default();
        match elements.iter_mut().find(|e| e.widget == element.widget) {
            Some(existing) => *existing = element,
            None => elements.push(element),
        }
    }

    /// Remove the widget's element and every mount point it owns
    pub fn unmount(&mut self, widget: WidgetId) {
        self.mounts.retain(|mount, _| mount.owner() != Some(widget));
        for elements in self.mounts.values_mut() {
            elements.retain(|e| e.widget != widget);
        }
    }

    /// Elements of a mount point in render order
    pub fn elements(&self, mount: Mount) -> &[Element] {
        self.mounts.get(&mount).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn element(&self, widget: WidgetId) -> Option<&Element> {
        self.mounts
            .values()
            .flat_map(|elements| elements.iter())
            .find(|e| e.widget == widget)
    }

    pub fn element_mut(&mut self, widget: WidgetId) -> Option<&mut Element> {
        self.mounts
            .values_mut()
            .flat_map(|elements| elements.iter_mut())
            .find(|e| e.widget == widget)
    }

    /// Mount point an element currently lives in
    pub fn mount_of(&self, widget: WidgetId) -> Option<Mount> {
        self.mounts
            .iter()
            .find(|(_, elements)| elements.iter().any(|e| e.widget == widget))
            .map(|(mount, _)| *mount)
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> WidgetId {
        WidgetId(n)
    }

    #[test]
    fn test_mount_order_and_replace() {
        let mut p = Presentation::new();
        p.mount(Mount::Root, Element::new(id(1), "field text").with_label("A"));
        p.mount(Mount::Root, Element::new(id(2), "field number"));
        p.mount(Mount::Root, Element::new(id(1), "field text").with_label("B"));

        let elements = p.elements(Mount::Root);
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].label, "B");
        assert_eq!(elements[1].widget, id(2));
    }

    #[test]
    fn test_unmount_drops_owned_mounts() {
        let mut p = Presentation::new();
        p.mount(Mount::Root, Element::new(id(1), "field group"));
        p.mount(Mount::Content(id(1)), Element::new(id(2), "field text"));
        p.unmount(id(1));
        assert!(p.elements(Mount::Root).is_empty());
        assert!(p.elements(Mount::Content(id(1))).is_empty());
        assert!(p.is_empty());
    }

    #[test]
    fn test_classes() {
        let mut e = Element::new(id(1), "field");
        e.add_class("group");
        e.add_class("group");
        assert_eq!(e.class, "field group");
        assert!(e.has_class("group"));
        assert!(!e.has_class("grou"));
    }
}
