//! Key paths into the params tree

use serde_json::{Map, Value};
use std::fmt;

/// Location of a value inside a params object, as a list of object keys.
///
/// The empty path addresses the root object itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ParamsPath(Vec<String>);

impl ParamsPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the child keyed by `name` below this one
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// First key of the path, if any
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Parse a `/`-separated path, ignoring empty segments
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Read the value at this path
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(root, |current, key| current.as_object()?.get(key))
    }

    /// Write or clear the value at this path.
    ///
    /// Setting creates missing (or non-object) intermediate objects; clearing
    /// removes the key and leaves parents in place. Clearing the root resets it
    /// to an empty object.
    pub fn set(&self, root: &mut Value, value: Option<Value>) {
        let Some((last, parents)) = self.0.split_last() else {
            *root = value.unwrap_or_else(|| Value::Object(Map::new()));
            return;
        };

        match value {
            Some(value) => {
                let mut current = root;
                for key in parents {
                    current = ensure_object(current)
                        .entry(key.clone())
                        .or_insert_with(|| Value::Object(Map::new()));
                }
                ensure_object(current).insert(last.clone(), value);
            }
            None => {
                let mut current = root;
                for key in parents {
                    match current.as_object_mut().and_then(|map| map.get_mut(key)) {
                        Some(next) => current = next,
                        None => return,
                    }
                }
                if let Some(map) = current.as_object_mut() {
                    map.remove(last);
                }
            }
        }
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

impl fmt::Display for ParamsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested() {
        let params = json!({"a": {"b": 3}});
        assert_eq!(ParamsPath::parse("a/b").get(&params), Some(&json!(3)));
        assert_eq!(ParamsPath::parse("a/c").get(&params), None);
        assert_eq!(ParamsPath::root().get(&params), Some(&params));
    }

    #[test]
    fn test_set_creates_parents() {
        let mut params = json!({});
        ParamsPath::parse("group/title").set(&mut params, Some(json!("x")));
        assert_eq!(params, json!({"group": {"title": "x"}}));
    }

    #[test]
    fn test_set_replaces_scalar_parent() {
        let mut params = json!({"group": ""});
        ParamsPath::parse("group/title").set(&mut params, Some(json!(1)));
        assert_eq!(params, json!({"group": {"title": 1}}));
    }

    #[test]
    fn test_clear_removes_key_only() {
        let mut params = json!({"group": {"title": "x", "n": 1}});
        let path = ParamsPath::parse("group/title");
        path.set(&mut params, None);
        assert_eq!(params, json!({"group": {"n": 1}}));

        // clearing below a missing parent is a no-op
        ParamsPath::parse("missing/key").set(&mut params, None);
        assert_eq!(params, json!({"group": {"n": 1}}));
    }

    #[test]
    fn test_display() {
        assert_eq!(ParamsPath::parse("a/b").to_string(), "/a/b");
        assert_eq!(ParamsPath::root().to_string(), "/");
    }
}
