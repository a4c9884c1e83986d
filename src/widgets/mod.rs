//! Built-in widgets
//!
//! Each widget is registered under the names semantics use in their `type`
//! or `widget` attribute.

mod boolean;
mod coordinates;
mod copyright;
mod dimensions;
mod file;
mod group;
mod none;
mod number;
mod text;
mod textarea;

pub use boolean::BooleanWidget;
pub use coordinates::CoordinatesWidget;
pub use copyright::copyright_field;
pub use dimensions::DimensionsWidget;
pub use file::FileWidget;
pub use group::GroupWidget;
pub use none::NoneWidget;
pub use number::NumberWidget;
pub use text::TextWidget;
pub use textarea::TextareaWidget;

use semform_core::{Element, Registry, WidgetId, WidgetType};
use semform_types::{Field, ValidationError};
use serde_json::Value;

/// Built-in widget types by name
const BUILTIN: &[(&str, WidgetType)] = &[
    ("text", WidgetType::new(TextWidget::construct)),
    ("textarea", WidgetType::new(TextareaWidget::construct)),
    ("number", WidgetType::new(NumberWidget::construct)),
    ("boolean", WidgetType::new(BooleanWidget::construct)),
    ("none", WidgetType::new(NoneWidget::construct)),
    ("group", WidgetType::new(GroupWidget::construct)),
    ("file", WidgetType::new(FileWidget::construct)),
    ("image", WidgetType::new(FileWidget::construct)),
    (
        "dimensions",
        WidgetType::new(DimensionsWidget::construct).with_references(&["max", "default"]),
    ),
    (
        "coordinates",
        WidgetType::new(CoordinatesWidget::construct).with_references(&["max"]),
    ),
];

/// Register all built-in widgets in the global registry
pub fn register_all() {
    for (name, widget) in BUILTIN {
        semform_core::register(name, *widget);
    }
    log::debug!("Registered {} built-in widgets", BUILTIN.len());
}

/// A registry holding only the built-in widgets, independent of the global one
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    for (name, widget) in BUILTIN {
        registry.register(name, *widget);
    }
    registry
}

/// Name used for a field in error messages
pub(crate) fn property_name(field: &Field) -> String {
    let label = field.display_label();
    if label.is_empty() {
        field.name.clone()
    } else {
        label
    }
}

/// Standard element for a leaf field
pub(crate) fn field_element(id: WidgetId, field: &Field) -> Element {
    Element::new(id, format!("field {}", field.widget_name()))
        .with_label(field.display_label())
        .with_description(field.description.clone())
}

/// Text of a params value as shown in an input
pub(crate) fn input_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `width` and `height` of a size-bearing value
pub(crate) fn size_of(value: Option<&Value>) -> Option<(u64, u64)> {
    let value = value?;
    Some((
        parse_dimension(value.get("width")?)?,
        parse_dimension(value.get("height")?)?,
    ))
}

fn parse_dimension(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => parse_digits(s.trim()),
        _ => None,
    }
}

/// Non-negative integer written with digits only
pub(crate) fn parse_digits(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Check one trimmed input of a two-value widget.
///
/// `Ok(None)` is an empty input the field allows.
pub(crate) fn check_digits(
    value: &str,
    property: &str,
    optional: bool,
    max: Option<u64>,
) -> Result<Option<u64>, ValidationError> {
    if value.is_empty() {
        return if optional {
            Ok(None)
        } else {
            Err(ValidationError::Required {
                property: property.to_string(),
            })
        };
    }
    let n = parse_digits(value).ok_or_else(|| ValidationError::OnlyNumbers {
        property: property.to_string(),
    })?;
    match max {
        Some(max) if n > max => Err(ValidationError::ExceedsMax {
            property: property.to_string(),
            max: max as f64,
        }),
        _ => Ok(Some(n)),
    }
}

/// Escape text for storage the way the content player expects it
pub(crate) fn escape_html(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Inverse of [`escape_html`], for showing stored text in an input
pub(crate) fn unescape_html(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
