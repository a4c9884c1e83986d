//! Reference resolution between fields
//!
//! A widget follows another field by path. Resolution waits until the tree
//! finished building (the target may come later in schema order), then
//! memoizes the target and subscribes to its changes.

use crate::error::FormError;
use crate::tree::{FormTree, WidgetId};
use crate::widget::Capability;
use semform_types::ReferencePath;
use serde_json::Value;

/// A reference attribute: a path until resolved, then the target widget
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Pending(ReferencePath),
    Resolved {
        target: WidgetId,
        /// Delivered while the target has no value
        default: Option<Value>,
    },
}

impl FormTree {
    /// Make `consumer` follow the field at `path` under `attr`
    pub fn follow(
        &mut self,
        consumer: WidgetId,
        attr: &str,
        path: ReferencePath,
        expected: Capability,
    ) -> Result<(), FormError> {
        self.node_mut(consumer)
            .ok_or(FormError::WidgetUnavailable(consumer))?
            .references
            .insert(attr.to_string(), Reference::Pending(path));

        let attr = attr.to_string();
        self.ready(move |tree| tree.resolve_reference(consumer, &attr, expected))
    }

    fn resolve_reference(
        &mut self,
        consumer: WidgetId,
        attr: &str,
        expected: Capability,
    ) -> Result<(), FormError> {
        let path = match self.node(consumer).and_then(|n| n.references.get(attr)) {
            Some(Reference::Pending(path)) => path.clone(),
            // already resolved, or the consumer is gone
            _ => return Ok(()),
        };

        let target = self
            .find_field(consumer, &path.path)
            .ok_or_else(|| FormError::UnknownFieldPath {
                path: path.path.clone(),
                field: self.path_of(consumer),
            })?;
        if !self.provides(target, expected) {
            return Err(FormError::WrongFieldKind {
                path: path.path.clone(),
                field: self.path_of(consumer),
                expected,
            });
        }

        if let Some(node) = self.node_mut(consumer) {
            node.references.insert(
                attr.to_string(),
                Reference::Resolved {
                    target,
                    default: path.default.clone(),
                },
            );
        }
        self.subscribe(consumer, target, attr, path.default)?;
        Ok(())
    }

    /// Current state of a reference attribute
    pub fn reference(&self, consumer: WidgetId, attr: &str) -> Option<&Reference> {
        self.node(consumer).and_then(|n| n.references.get(attr))
    }

    /// Locate the field named by `path` as seen from `from`.
    ///
    /// The search starts in `from`'s parent. A path starting with `..` is
    /// taken literally from there; any other path is tried in each ancestor
    /// in turn, nearest first.
    pub fn find_field(&self, from: WidgetId, path: &str) -> Option<WidgetId> {
        let segments: Vec<&str> = path
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        let first = *segments.first()?;
        let scope = self.parent(from).unwrap_or(WidgetId::ROOT);

        let walk = |start: WidgetId| {
            segments.iter().try_fold(start, |current, segment| {
                if *segment == ".." {
                    self.parent(current)
                } else {
                    self.child_named(current, segment)
                }
            })
        };

        if first == ".." {
            return walk(scope);
        }
        let mut current = Some(scope);
        while let Some(scope) = current {
            if let Some(found) = walk(scope) {
                return Some(found);
            }
            current = self.parent(scope);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{deliveries, stub_tree};
    use crate::widget::Input;
    use semform_types::Field;
    use serde_json::json;

    fn follower(name: &str, max: serde_json::Value) -> Field {
        let mut field = Field::new(name, "group").with_widget("stub-refs");
        field.max = Some(max);
        field
    }

    #[test]
    fn test_forward_and_backward_references() {
        let mut tree = stub_tree(json!({"src": {"width": 800, "height": 600}}));
        let ids = tree
            .build(&[
                follower("before", json!("src")),
                Field::new("src", "sized"),
                follower("after", json!("src")),
            ])
            .unwrap();
        let size = Some(json!({"width": 800, "height": 600}));

        assert_eq!(deliveries(ids[0]), vec![("max".to_string(), size.clone())]);
        assert_eq!(deliveries(ids[2]), vec![("max".to_string(), size)]);
    }

    #[test]
    fn test_resolution_is_memoized_and_pushed() {
        let mut tree = stub_tree(json!({}));
        let ids = tree
            .build(&[follower("c", json!("src")), Field::new("src", "sized")])
            .unwrap();
        let (consumer, src) = (ids[0], ids[1]);

        assert_eq!(
            tree.reference(consumer, "max"),
            Some(&Reference::Resolved {
                target: src,
                default: None
            })
        );

        tree.input(src, Input::Text("changed".into())).unwrap();
        assert_eq!(
            deliveries(consumer),
            vec![
                ("max".to_string(), None),
                ("max".to_string(), Some(json!("changed")))
            ]
        );
    }

    #[test]
    fn test_fallback_default() {
        let mut tree = stub_tree(json!({}));
        let ids = tree
            .build(&[
                follower("c", json!({"path": "src", "default": {"width": 5}})),
                Field::new("src", "sized"),
            ])
            .unwrap();
        assert_eq!(
            deliveries(ids[0]),
            vec![("max".to_string(), Some(json!({"width": 5})))]
        );
    }

    #[test]
    fn test_outward_search_and_explicit_parent() {
        let mut tree = stub_tree(json!({}));
        tree.build(&[
            Field::new("src", "sized"),
            Field::new("g", "group").with_fields(vec![
                follower("near", json!("src")),
                follower("up", json!("../src")),
                Field::new("h", "group").with_fields(vec![follower("deep", json!("src"))]),
            ]),
        ])
        .unwrap();

        let src = tree.find("src").unwrap();
        for path in ["g/near", "g/up", "g/h/deep"] {
            let consumer = tree.find(path).unwrap();
            assert_eq!(tree.find_field(consumer, "src"), Some(src), "{}", path);
        }

        // an explicit `..` does not search further out
        let deep = tree.find("g/h/deep").unwrap();
        assert_eq!(tree.find_field(deep, "../src"), None);
        assert_eq!(tree.find_field(deep, "../../src"), Some(src));
        assert_eq!(tree.find_field(deep, "../../../src"), None);
        assert_eq!(tree.find_field(deep, ""), None);
    }

    #[test]
    fn test_nested_path() {
        let mut tree = stub_tree(json!({}));
        tree.build(&[
            Field::new("media", "group").with_fields(vec![Field::new("poster", "sized")]),
            follower("c", json!("media/poster")),
        ])
        .unwrap();
        let c = tree.find("c").unwrap();
        assert_eq!(tree.find_field(c, "media/poster"), tree.find("media/poster"));
    }

    #[test]
    fn test_unknown_path_is_fatal() {
        let mut tree = stub_tree(json!({}));
        let err = tree
            .build(&[follower("c", json!("nowhere"))])
            .unwrap_err();
        assert!(matches!(
            err,
            FormError::UnknownFieldPath { ref path, ref field } if path == "nowhere" && field == "/c"
        ));
        assert!(!tree.is_building());
    }

    #[test]
    fn test_wrong_kind_is_fatal() {
        let mut tree = stub_tree(json!({}));
        let err = tree
            .build(&[follower("c", json!("plain")), Field::new("plain", "text")])
            .unwrap_err();
        assert!(matches!(
            err,
            FormError::WrongFieldKind { expected: Capability::Size, .. }
        ));
    }

    #[test]
    fn test_follow_after_build_resolves_immediately() {
        let mut tree = stub_tree(json!({"src": 1}));
        let ids = tree
            .build(&[Field::new("src", "sized"), Field::new("late", "stub")])
            .unwrap();
        tree.follow(ids[1], "max", ReferencePath::new("src"), Capability::Size)
            .unwrap();
        assert_eq!(deliveries(ids[1]), vec![("max".to_string(), Some(json!(1)))]);
    }
}
