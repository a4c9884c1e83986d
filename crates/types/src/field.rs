//! Field schema nodes ("semantics") describing what a form is made of

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Label of a field.
///
/// Semantics use `0` (or `false`) to suppress the label entirely, which is
/// different from leaving it out (the field name is shown then).
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    /// Display text
    Text(String),
    /// No label at all
    Hidden,
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Label::Text(text) => serializer.serialize_str(text),
            Label::Hidden => serializer.serialize_u8(0),
        }
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(Label::Text(text)),
            Value::Bool(false) => Ok(Label::Hidden),
            Value::Number(n) if n.as_f64() == Some(0.0) => Ok(Label::Hidden),
            other => Err(serde::de::Error::custom(format!(
                "expected a label string or 0, got {}",
                other
            ))),
        }
    }
}

/// Regular expression constraint on text fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regexp {
    pub pattern: String,
    /// Flag letters as written in semantics (e.g. "i")
    #[serde(default)]
    pub modifiers: String,
}

/// A single node of the field schema.
///
/// Nodes are immutable for the lifetime of a form; widgets that need a
/// rewritten schema (deprecated groups, optional propagation) clone it first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique among siblings, also the key in the params object
    #[serde(default)]
    pub name: String,
    /// Primitive kind (text, number, group, image, ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Explicit widget override, falls back to `kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub deprecated: bool,
    /// Groups start expanded when set
    #[serde(default)]
    pub expanded: bool,
    #[serde(default)]
    pub common: bool,
    /// Literal default value, or a reference path for reference-bearing widgets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Child nodes of composite fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    /// Numeric maximum, or a reference path on size-aware widgets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexp: Option<Regexp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimes: Option<Vec<String>>,
}

impl Field {
    /// Create a field with the given name and kind
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Name of the widget implementation to use for this field
    pub fn widget_name(&self) -> &str {
        self.widget.as_deref().unwrap_or(&self.kind)
    }

    /// Label as displayed: absent falls back to the name, hidden is empty
    pub fn display_label(&self) -> String {
        match &self.label {
            None => self.name.clone(),
            Some(Label::Hidden) => String::new(),
            Some(Label::Text(text)) => text.clone(),
        }
    }

    /// Numeric maximum, if `max` holds a literal number
    pub fn max_number(&self) -> Option<f64> {
        self.max.as_ref().and_then(Value::as_f64)
    }

    /// Raw value of an attribute that may carry a reference
    pub fn attribute(&self, attr: &str) -> Option<&Value> {
        match attr {
            "max" => self.max.as_ref(),
            "default" => self.default.as_ref(),
            _ => None,
        }
    }

    /// Reference path held by `attr`, if it names another field
    pub fn reference(&self, attr: &str) -> Option<ReferencePath> {
        self.attribute(attr).and_then(ReferencePath::from_value)
    }

    /// Mark this field and every descendant as optional
    pub fn force_optional(&mut self) {
        self.optional = true;
        for child in &mut self.fields {
            child.force_optional();
        }
    }

    /// Builder-style helpers, mostly for tests and programmatic semantics
    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_widget(mut self, widget: impl Into<String>) -> Self {
        self.widget = Some(widget.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Path to another field, as written in semantics.
///
/// Either a plain string (`"image"`, `"../size"`) or an object carrying a
/// fallback value used while the referenced field has no value.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePath {
    pub path: String,
    pub default: Option<Value>,
}

impl ReferencePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default: None,
        }
    }

    /// Interpret a schema attribute as a reference path
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(path) => Some(Self::new(path.clone())),
            Value::Object(map) => map.get("path").and_then(Value::as_str).map(|path| Self {
                path: path.to_string(),
                default: map.get("default").cloned(),
            }),
            _ => None,
        }
    }
}

/// Parse a semantics document (a JSON array of fields)
pub fn parse_semantics(json: &str) -> Result<Vec<Field>, serde_json::Error> {
    serde_json::from_str(json)
}
