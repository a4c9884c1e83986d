//! Fatal construction-time errors

use crate::tree::WidgetId;
use crate::widget::Capability;
use thiserror::Error;

/// Errors that halt building a form.
///
/// Anything that can go wrong with user input is a
/// [`ValidationError`](semform_types::ValidationError) instead.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Unknown widget {widget} for field {field}")]
    UnknownWidget { widget: String, field: String },

    #[error("Field {index} of {context} is missing its {property} property")]
    MissingProperty {
        index: usize,
        property: &'static str,
        context: String,
    },

    #[error("Duplicate field name {name} in {context}")]
    DuplicateField { name: String, context: String },

    #[error("Unknown field path {path} referenced by {field}")]
    UnknownFieldPath { path: String, field: String },

    #[error("Field {path} referenced by {field} is not a {expected} field")]
    WrongFieldKind {
        path: String,
        field: String,
        expected: Capability,
    },

    #[error("Invalid regexp {pattern} on field {field}: {reason}")]
    InvalidPattern {
        field: String,
        pattern: String,
        reason: String,
    },

    #[error("No field at {0}")]
    NoSuchField(String),

    #[error("Widget {0} is not available")]
    WidgetUnavailable(WidgetId),

    #[error("Invalid semantics: {0}")]
    InvalidSemantics(#[from] serde_json::Error),
}
