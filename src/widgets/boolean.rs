//! Checkbox widget

use super::field_element;
use semform_core::{BoxedWidget, FormError, Input, Mount, Validation, Widget, WidgetCx};
use semform_types::{Field, ValidationError};
use serde_json::Value;

pub struct BooleanWidget {
    field: Field,
    checked: bool,
}

impl BooleanWidget {
    /// Missing params are stored as `false` right away, so a boolean always
    /// has a value
    pub fn construct(
        cx: &mut WidgetCx<'_>,
        field: Field,
        params: Option<Value>,
    ) -> Result<BoxedWidget, FormError> {
        let checked = match params {
            Some(value) => value.as_bool().unwrap_or(false),
            None => {
                cx.set_value(Some(Value::Bool(false)))?;
                false
            }
        };
        Ok(Box::new(Self { field, checked }))
    }
}

impl Widget for BooleanWidget {
    fn field(&self) -> &Field {
        &self.field
    }

    fn attach(&mut self, cx: &mut WidgetCx<'_>, mount: Mount) -> Result<(), FormError> {
        let element = field_element(cx.id(), &self.field);
        cx.mount(mount, element);
        Ok(())
    }

    fn validate(&mut self) -> Validation {
        Validation::Valid(Some(Value::Bool(self.checked)))
    }

    fn errors(&self) -> &[ValidationError] {
        &[]
    }

    fn handle(&mut self, cx: &mut WidgetCx<'_>, input: Input) -> Result<(), FormError> {
        match input {
            Input::Check(checked) => {
                self.checked = checked;
                cx.set_value(Some(Value::Bool(checked)))
            }
            other => {
                log::debug!("boolean widget ignores {:?}", other);
                Ok(())
            }
        }
    }
}
