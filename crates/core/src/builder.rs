//! Tree builder: one widget per schema node, in schema order

use crate::error::FormError;
use crate::presentation::Mount;
use crate::tree::{FormTree, ParamsSlot, WidgetId};
use crate::widget::WidgetCx;
use semform_types::Field;
use std::collections::HashSet;

/// How children find their params
#[derive(Debug, Clone)]
pub enum ChildSlots {
    /// Each child reads and writes the key named after it below this slot
    Keyed(ParamsSlot),
    /// Every child shares this slot (single-child composites)
    Shared(ParamsSlot),
}

impl ChildSlots {
    fn slot_for(&self, name: &str) -> ParamsSlot {
        match self {
            ChildSlots::Keyed(base) => base.child(name),
            ChildSlots::Shared(slot) => slot.clone(),
        }
    }
}

impl FormTree {
    /// Build `fields` as children of `parent`.
    ///
    /// Opens a construction pass; when it is the outermost one, deferred
    /// tasks are drained before returning, so every reference made while
    /// building is live afterwards.
    pub(crate) fn build_fields(
        &mut self,
        parent: WidgetId,
        fields: &[Field],
        slots: ChildSlots,
        mount: Mount,
    ) -> Result<Vec<WidgetId>, FormError> {
        self.ready.begin_pass();
        let result = self.build_each(parent, fields, &slots, mount);
        let outermost = self.ready.end_pass();

        if outermost {
            match &result {
                Ok(_) => self.drain_ready()?,
                Err(_) => self.ready.clear(),
            }
        }
        result
    }

    fn build_each(
        &mut self,
        parent: WidgetId,
        fields: &[Field],
        slots: &ChildSlots,
        mount: Mount,
    ) -> Result<Vec<WidgetId>, FormError> {
        let context = self.path_of(parent);
        let mut seen = HashSet::new();
        let mut built = Vec::with_capacity(fields.len());

        for (index, field) in fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(FormError::MissingProperty {
                    index,
                    property: "name",
                    context,
                });
            }
            if field.kind.is_empty() && field.widget.is_none() {
                return Err(FormError::MissingProperty {
                    index,
                    property: "type",
                    context,
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(FormError::DuplicateField {
                    name: field.name.clone(),
                    context,
                });
            }

            let widget_name = field.widget_name();
            let widget_type =
                self.registry
                    .resolve(widget_name)
                    .ok_or_else(|| FormError::UnknownWidget {
                        widget: widget_name.to_string(),
                        field: field.name.clone(),
                    })?;

            let slot = slots.slot_for(&field.name);
            let mut params = self.read_slot(&slot);
            if params.is_none() && !widget_type.is_reference("default") {
                if let Some(default) = &field.default {
                    self.write_slot(&slot, Some(default.clone()))?;
                    params = Some(default.clone());
                }
            }

            let id = self.alloc(parent, &field.name, slot);
            log::debug!(
                "Building {} widget for {}",
                widget_name,
                self.path_of(id)
            );

            let widget = {
                let mut cx = WidgetCx { tree: self, id };
                (widget_type.construct)(&mut cx, field.clone(), params)?
            };
            if let Some(node) = self.node_mut(id) {
                node.widget = Some(widget);
            }
            self.flush_inbox(id)?;

            self.with_widget(id, |widget, cx| widget.attach(cx, mount))?;
            built.push(id);
        }

        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::Mount;
    use crate::testing::{stub_tree, Stub};
    use serde_json::json;

    #[test]
    fn test_tree_shape_follows_schema() {
        let mut tree = stub_tree(json!({}));
        let ids = tree
            .build(&[
                Field::new("a", "stub"),
                Field::new("g", "stub")
                    .with_fields(vec![Field::new("x", "stub"), Field::new("y", "stub")]),
                Field::new("c", "stub"),
            ])
            .unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(tree.children(WidgetId::ROOT), ids.as_slice());
        let g = ids[1];
        let names: Vec<_> = tree
            .children(g)
            .iter()
            .map(|c| tree.name(*c).unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["x", "y"]);

        let rendered: Vec<_> = tree
            .presentation()
            .elements(Mount::Root)
            .iter()
            .map(|e| e.widget)
            .collect();
        assert_eq!(rendered, ids);
        assert_eq!(tree.presentation().elements(Mount::Content(g)).len(), 2);
    }

    #[test]
    fn test_literal_default_applied_when_unset() {
        let mut tree = stub_tree(json!({"b": "kept"}));
        let mut a = Field::new("a", "stub");
        a.default = Some(json!("fallback"));
        let mut b = Field::new("b", "stub");
        b.default = Some(json!("ignored"));
        tree.build(&[a, b]).unwrap();

        assert_eq!(tree.params(), &json!({"a": "fallback", "b": "kept"}));
    }

    #[test]
    fn test_reference_default_not_written() {
        let mut tree = stub_tree(json!({}));
        let mut field = Field::new("size", "group").with_widget("stub-refs");
        field.default = Some(json!("source"));
        tree.build(&[Field::new("source", "sized"), field]).unwrap();
        assert_eq!(tree.params(), &json!({}));
    }

    #[test]
    fn test_missing_properties() {
        let mut tree = stub_tree(json!({}));
        let err = tree.build(&[Field::new("", "stub")]).unwrap_err();
        assert!(matches!(
            err,
            FormError::MissingProperty { index: 0, property: "name", .. }
        ));

        let err = tree
            .build(&[Field::new("ok", "stub"), Field::new("nameless", "")])
            .unwrap_err();
        assert!(matches!(
            err,
            FormError::MissingProperty { index: 1, property: "type", .. }
        ));
    }

    #[test]
    fn test_duplicate_sibling_is_fatal() {
        let mut tree = stub_tree(json!({}));
        let err = tree
            .build(&[Field::new("a", "stub"), Field::new("a", "stub")])
            .unwrap_err();
        assert!(matches!(err, FormError::DuplicateField { ref name, .. } if name == "a"));

        // the same name in different containers is fine
        let mut tree = stub_tree(json!({}));
        tree.build(&[
            Field::new("a", "stub"),
            Field::new("g", "stub").with_fields(vec![Field::new("a", "stub")]),
        ])
        .unwrap();
    }

    #[test]
    fn test_unknown_widget_is_fatal() {
        let mut tree = stub_tree(json!({}));
        let err = tree
            .build(&[Field::new("a", "stub").with_widget("colorpicker")])
            .unwrap_err();
        assert!(matches!(
            err,
            FormError::UnknownWidget { ref widget, ref field } if widget == "colorpicker" && field == "a"
        ));
        assert!(!tree.is_building());
    }

    #[test]
    fn test_shared_slot() {
        let mut tree = stub_tree(json!({"g": "shared"}));
        tree.build(&[Field::new("g", "stub-single")
            .with_fields(vec![Field::new("only", "stub")])])
            .unwrap();
        let only = tree.find("g/only").unwrap();
        assert_eq!(tree.value_of(only), Some(json!("shared")));
        assert!(Stub::constructed_with(only, Some(json!("shared"))));
    }
}
