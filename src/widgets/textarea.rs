//! Multi line text widget

use super::text::TextRules;
use super::{escape_html, field_element, input_text, unescape_html};
use semform_core::{BoxedWidget, FormError, Input, Mount, Validation, Widget, WidgetCx};
use semform_types::{Field, ValidationError};
use serde_json::Value;

/// Like the text widget, but stores empty text instead of clearing it
pub struct TextareaWidget {
    field: Field,
    rules: TextRules,
    input: String,
    errors: Vec<ValidationError>,
}

impl TextareaWidget {
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

impl Widget for TextareaWidget {
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
        if self.rules.check(value, &mut self.errors) {
            Validation::Valid(Some(Value::String(escape_html(value))))
        } else {
            Validation::Invalid
        }
    }

    fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    fn handle(&mut self, cx: &mut WidgetCx<'_>, input: Input) -> Result<(), FormError> {
        let Input::Text(text) = input else {
            log::debug!("textarea widget ignores {:?}", input);
            return Ok(());
        };
        self.input = text;
        match self.validate() {
            Validation::Valid(value) => cx.set_value(value),
            Validation::Invalid => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::widgets::builtin_registry;
    use semform_core::{FormOptions, FormTree, Input, ValidationError};
    use semform_types::Field;
    use serde_json::json;

    #[test]
    fn test_optional_empty_is_stored() {
        let mut tree = FormTree::new(builtin_registry(), json!({}), FormOptions::default());
        let id = tree
            .build(&[Field::new("notes", "textarea").optional()])
            .unwrap()[0];
        tree.input(id, Input::Text("  ".into())).unwrap();
        assert_eq!(tree.params(), &json!({"notes": ""}));
    }

    #[test]
    fn test_multiline_escaped() {
        let mut tree = FormTree::new(builtin_registry(), json!({}), FormOptions::default());
        let id = tree.build(&[Field::new("notes", "textarea")]).unwrap()[0];
        tree.input(id, Input::Text("a\n<b>".into())).unwrap();
        assert_eq!(tree.params(), &json!({"notes": "a\n&lt;b&gt;"}));

        tree.input(id, Input::Text("".into())).unwrap();
        assert!(matches!(tree.errors(id), [ValidationError::Required { .. }]));
    }
}
