//! Single line text widget

use super::{escape_html, field_element, input_text, property_name, unescape_html};
use regex::Regex;
use semform_core::{
    BoxedWidget, Capability, FormError, Input, Mount, Validation, Widget, WidgetCx,
};
use semform_types::{Field, Regexp, ValidationError};
use serde_json::Value;

/// Constraints shared by the text widgets
pub(crate) struct TextRules {
    property: String,
    optional: bool,
    max_length: Option<usize>,
    pattern: Option<Regex>,
}

impl TextRules {
    pub fn new(field: &Field) -> Result<Self, FormError> {
        let pattern = field
            .regexp
            .as_ref()
            .map(|regexp| compile(field, regexp))
            .transpose()?;
        Ok(Self {
            property: property_name(field),
            optional: field.optional,
            max_length: field.max_length,
            pattern,
        })
    }

    /// Check trimmed input, pushing at most one error
    pub fn check(&self, value: &str, errors: &mut Vec<ValidationError>) -> bool {
        if !self.optional && value.is_empty() {
            errors.push(ValidationError::Required {
                property: self.property.clone(),
            });
        } else if let Some(max) = self.max_length.filter(|max| value.chars().count() > *max) {
            errors.push(ValidationError::TooLong { max });
        } else if let Some(pattern) = &self.pattern {
            if !value.is_empty() && !pattern.is_match(value) {
                errors.push(ValidationError::InvalidFormat);
            }
        }
        errors.is_empty()
    }
}

/// Translate semantics modifiers into inline regex flags.
///
/// `g` has no meaning for a match test and is dropped along with anything
/// the regex engine does not know.
fn compile(field: &Field, regexp: &Regexp) -> Result<Regex, FormError> {
    let flags: String = regexp
        .modifiers
        .chars()
        .filter(|c| matches!(c, 'i' | 'm' | 's' | 'x'))
        .collect();
    let source = if flags.is_empty() {
        regexp.pattern.clone()
    } else {
        format!("(?{}){}", flags, regexp.pattern)
    };
    Regex::new(&source).map_err(|e| FormError::InvalidPattern {
        field: field.name.clone(),
        pattern: regexp.pattern.clone(),
        reason: e.to_string(),
    })
}

pub struct TextWidget {
    field: Field,
    rules: TextRules,
    /// Current contents of the input, unescaped
    input: String,
    errors: Vec<ValidationError>,
}

impl TextWidget {
    pub fn construct(
        _cx: &mut WidgetCx<'_>,
        field: Field,
        params: Option<Value>,
    ) -> Result<BoxedWidget, FormError> {
        Ok(Box::new(Self {
            rules: TextRules::new(&field)?,
            input: unescape_html(&input_text(params.as_ref())),
            field,
            errors: Vec::new(),
        }))
    }
}

impl Widget for TextWidget {
    fn field(&self) -> &Field {
        &self.field
    }

    fn attach(&mut self, cx: &mut WidgetCx<'_>, mount: Mount) -> Result<(), FormError> {
        let element = field_element(cx.id(), &self.field);
        cx.mount(mount, element);
        Ok(())
    }

    fn validate(&mut self) -> Validation {
        self.errors.clear();
        let value = self.input.trim();
        if !self.rules.check(value, &mut self.errors) {
            return Validation::Invalid;
        }
        if value.is_empty() {
            // empty strings are never stored
            Validation::Valid(None)
        } else {
            Validation::Valid(Some(Value::String(escape_html(value))))
        }
    }

    fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    fn provides(&self, capability: Capability) -> bool {
        capability == Capability::Text
    }

    fn handle(&mut self, cx: &mut WidgetCx<'_>, input: Input) -> Result<(), FormError> {
        let Input::Text(text) = input else {
            log::debug!("text widget ignores {:?}", input);
            return Ok(());
        };
        self.input = text;
        match self.validate() {
            Validation::Valid(value) => cx.set_value(value),
            Validation::Invalid => Ok(()),
        }
    }
}
