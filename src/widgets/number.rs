//! Number widget

use super::{field_element, input_text, property_name};
use once_cell::sync::Lazy;
use regex::Regex;
use semform_core::{BoxedWidget, FormError, Input, Mount, Validation, Widget, WidgetCx};
use semform_types::{Field, ValidationError};
use serde_json::{Number, Value};

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+$").expect("Invalid regex"));
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+([.,][0-9]+)?$").expect("Invalid regex"));

pub struct NumberWidget {
    field: Field,
    input: String,
    errors: Vec<ValidationError>,
}

impl NumberWidget {
    pub fn construct(
        _cx: &mut WidgetCx<'_>,
        field: Field,
        params: Option<Value>,
    ) -> Result<BoxedWidget, FormError> {
        Ok(Box::new(Self {
            input: input_text(params.as_ref()),
            field,
            errors: Vec::new(),
        }))
    }

    fn allows_decimals(&self) -> bool {
        self.field.decimals.map_or(false, |d| d > 0)
    }

    /// Parse trimmed, non-empty input into a number value
    fn parse(&self, value: &str) -> Option<(f64, Value)> {
        if self.allows_decimals() {
            if !DECIMAL.is_match(value) {
                return None;
            }
            let n: f64 = value.replace(',', ".").parse().ok()?;
            Some((n, Value::Number(Number::from_f64(n)?)))
        } else {
            if !INTEGER.is_match(value) {
                return None;
            }
            let n: i64 = value.parse().ok()?;
            Some((n as f64, Value::from(n)))
        }
    }

    fn check_range(&self, n: f64) -> Option<ValidationError> {
        let property = property_name(&self.field);
        if let Some(max) = self.field.max_number().filter(|max| n > *max) {
            return Some(ValidationError::ExceedsMax { property, max });
        }
        if let Some(min) = self.field.min.filter(|min| n < *min) {
            return Some(ValidationError::BelowMin { property, min });
        }
        if let Some(step) = self.field.step.filter(|step| *step != 0.0 && n % *step != 0.0) {
            return Some(ValidationError::OutOfStep { property, step });
        }
        None
    }
}

impl Widget for NumberWidget {
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

        if value.is_empty() {
            if self.field.optional {
                return Validation::Valid(None);
            }
            self.errors.push(ValidationError::Required {
                property: property_name(&self.field),
            });
            return Validation::Invalid;
        }

        let Some((n, number)) = self.parse(value) else {
            self.errors.push(ValidationError::OnlyNumbers {
                property: property_name(&self.field),
            });
            return Validation::Invalid;
        };
        match self.check_range(n) {
            Some(error) => {
                self.errors.push(error);
                Validation::Invalid
            }
            None => Validation::Valid(Some(number)),
        }
    }

    fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    fn handle(&mut self, cx: &mut WidgetCx<'_>, input: Input) -> Result<(), FormError> {
        let Input::Text(text) = input else {
            log::debug!("number widget ignores {:?}", input);
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
    use semform_core::{FormOptions, FormTree, Input, ValidationError, WidgetId};
    use semform_types::Field;
    use serde_json::{json, Value};

    fn number_tree(field: Field, params: Value) -> (FormTree, WidgetId) {
        let mut tree = FormTree::new(builtin_registry(), params, FormOptions::default());
        let id = tree.build(&[field]).unwrap()[0];
        (tree, id)
    }

    fn bounded() -> Field {
        let mut field = Field::new("n", "number");
        field.min = Some(0.0);
        field.max = Some(json!(10));
        field.step = Some(5.0);
        field
    }

    #[test]
    fn test_step_and_bounds() {
        let (mut tree, id) = number_tree(bounded(), json!({}));

        tree.input(id, Input::Text("7".into())).unwrap();
        assert!(matches!(
            tree.errors(id),
            [ValidationError::OutOfStep { step, .. }] if *step == 5.0
        ));
        assert_eq!(tree.params(), &json!({}));

        tree.input(id, Input::Text("5".into())).unwrap();
        assert!(tree.errors(id).is_empty());
        assert_eq!(tree.params(), &json!({"n": 5}));

        tree.input(id, Input::Text("15".into())).unwrap();
        assert!(matches!(tree.errors(id), [ValidationError::ExceedsMax { .. }]));
        tree.input(id, Input::Text("-5".into())).unwrap();
        assert!(matches!(tree.errors(id), [ValidationError::BelowMin { .. }]));
        assert_eq!(tree.params(), &json!({"n": 5}));
    }

    #[test]
    fn test_only_numbers() {
        let (mut tree, id) = number_tree(Field::new("n", "number"), json!({}));
        for bad in ["abc", "1.5", "1e3", "--1"] {
            tree.input(id, Input::Text(bad.into())).unwrap();
            assert!(
                matches!(tree.errors(id), [ValidationError::OnlyNumbers { .. }]),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_decimals_accept_comma() {
        let mut field = Field::new("n", "number");
        field.decimals = Some(2);
        let (mut tree, id) = number_tree(field, json!({}));
        tree.input(id, Input::Text("2,5".into())).unwrap();
        assert_eq!(tree.params(), &json!({"n": 2.5}));
        tree.input(id, Input::Text("3".into())).unwrap();
        assert_eq!(tree.params(), &json!({"n": 3.0}));
    }

    #[test]
    fn test_empty() {
        let (mut tree, id) = number_tree(Field::new("n", "number"), json!({}));
        assert!(!tree.validate_all());
        assert!(matches!(tree.errors(id), [ValidationError::Required { .. }]));

        let (mut tree, _) = number_tree(Field::new("n", "number").optional(), json!({}));
        assert!(tree.validate_all());
    }

    #[test]
    fn test_existing_value_round_trips() {
        let (mut tree, _) = number_tree(bounded(), json!({"n": 10}));
        assert!(tree.validate_all());
        assert_eq!(tree.params(), &json!({"n": 10}));
    }
}
