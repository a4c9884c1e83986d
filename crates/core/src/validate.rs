//! Validation over a subtree

use crate::tree::{FormTree, WidgetId};
use semform_types::ValidationError;

impl FormTree {
    /// Validate a widget and every widget below it.
    ///
    /// All widgets are validated even after one fails, so each of them has
    /// a fresh error list afterwards. The tree root itself is always valid.
    pub fn validate_subtree(&mut self, id: WidgetId) -> bool {
        let mut valid = if id == WidgetId::ROOT {
            true
        } else {
            match self.node_mut(id).and_then(|n| n.widget.as_mut()) {
                Some(widget) => widget.validate().is_valid(),
                None => {
                    log::warn!("Cannot validate busy or missing widget {}", id);
                    false
                }
            }
        };

        for child in self.children(id).to_vec() {
            let child_valid = self.validate_subtree(child);
            valid = valid && child_valid;
        }
        valid
    }

    /// Validate the whole tree
    pub fn validate_all(&mut self) -> bool {
        self.validate_subtree(WidgetId::ROOT)
    }

    /// Errors of every widget below `id` from the last validation, with the
    /// widget's path
    pub fn collect_errors(&self, id: WidgetId) -> Vec<(String, ValidationError)> {
        let mut out = Vec::new();
        let ids = std::iter::once(id).chain(self.descendants(id));
        for widget in ids {
            for error in self.errors(widget) {
                out.push((self.path_of(widget), error.clone()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::stub_tree;
    use semform_types::Field;
    use serde_json::json;

    #[test]
    fn test_all_children_validated() {
        let mut tree = stub_tree(json!({}));
        tree.build(&[
            Field::new("bad1", "invalid"),
            Field::new("ok", "stub"),
            Field::new("g", "group").with_fields(vec![Field::new("bad2", "invalid")]),
        ])
        .unwrap();

        assert!(!tree.validate_all());
        let errors = tree.collect_errors(WidgetId::ROOT);
        let paths: Vec<_> = errors.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["/bad1", "/g/bad2"]);
    }

    #[test]
    fn test_subtree_only() {
        let mut tree = stub_tree(json!({}));
        tree.build(&[
            Field::new("bad", "invalid"),
            Field::new("g", "group").with_fields(vec![Field::new("ok", "stub")]),
        ])
        .unwrap();
        let g = tree.find("g").unwrap();
        assert!(tree.validate_subtree(g));
        assert!(!tree.validate_all());
    }

    #[test]
    fn test_validate_is_idempotent() {
        let mut tree = stub_tree(json!({"a": "x"}));
        tree.build(&[Field::new("a", "stub"), Field::new("b", "invalid")])
            .unwrap();
        let first = tree.validate_all();
        let errors = tree.collect_errors(WidgetId::ROOT).len();
        assert_eq!(tree.validate_all(), first);
        assert_eq!(tree.collect_errors(WidgetId::ROOT).len(), errors);
        assert_eq!(tree.params(), &json!({"a": "x"}));
    }

    #[test]
    fn test_empty_tree_is_valid() {
        let mut tree = stub_tree(json!({}));
        tree.build(&[]).unwrap();
        assert!(tree.validate_all());
    }
}
