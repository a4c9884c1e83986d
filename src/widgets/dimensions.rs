//! Width/height widget

use super::{check_digits, field_element, input_text, size_of};
use semform_core::{
    BoxedWidget, Capability, FormError, Input, Mount, Validation, Widget, WidgetCx,
};
use semform_types::{Field, ValidationError};
use serde_json::{Map, Value};

/// Two digit-only inputs stored as `{width, height}`.
///
/// `max` follows a sized field to bound both inputs. `default` follows a
/// sized field whose size is copied in, as long as the widget started out
/// without a width of its own.
pub struct DimensionsWidget {
    field: Field,
    width: String,
    height: String,
    max: Option<(u64, u64)>,
    follow_default: bool,
    errors: Vec<ValidationError>,
}

impl DimensionsWidget {
    pub fn construct(
        cx: &mut WidgetCx<'_>,
        field: Field,
        params: Option<Value>,
    ) -> Result<BoxedWidget, FormError> {
        let params = params.as_ref();
        let width = input_text(params.and_then(|p| p.get("width")));
        let height = input_text(params.and_then(|p| p.get("height")));

        if let Some(path) = field.reference("max") {
            cx.follow("max", path, Capability::Size)?;
        }
        if let Some(path) = field.reference("default") {
            cx.follow("default", path, Capability::Size)?;
        }

        Ok(Box::new(Self {
            follow_default: width.is_empty(),
            field,
            width,
            height,
            max: None,
            errors: Vec::new(),
        }))
    }
}

impl Widget for DimensionsWidget {
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
        let inputs = [
            ("width", self.width.trim(), self.max.map(|m| m.0)),
            ("height", self.height.trim(), self.max.map(|m| m.1)),
        ];

        let mut size = Map::new();
        for (property, value, max) in inputs {
            match check_digits(value, property, self.field.optional, max) {
                Ok(Some(n)) => {
                    size.insert(property.to_string(), Value::from(n));
                }
                Ok(None) => {}
                Err(error) => {
                    self.errors.push(error);
                    return Validation::Invalid;
                }
            }
        }

        if size.is_empty() {
            Validation::Valid(None)
        } else {
            Validation::Valid(Some(Value::Object(size)))
        }
    }

    fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    fn provides(&self, capability: Capability) -> bool {
        capability == Capability::Size
    }

    fn handle(&mut self, cx: &mut WidgetCx<'_>, input: Input) -> Result<(), FormError> {
        let Input::Pair(width, height) = input else {
            log::debug!("dimensions widget ignores {:?}", input);
            return Ok(());
        };
        self.width = width;
        self.height = height;
        match self.validate() {
            Validation::Valid(value) => cx.set_value(value),
            Validation::Invalid => Ok(()),
        }
    }

    fn reference_changed(
        &mut self,
        cx: &mut WidgetCx<'_>,
        attr: &str,
        value: Option<&Value>,
    ) -> Result<(), FormError> {
        let Some((width, height)) = size_of(value) else {
            return Ok(());
        };
        match attr {
            "max" => self.max = Some((width, height)),
            "default" if self.follow_default => {
                self.width = width.to_string();
                self.height = height.to_string();
                match self.validate() {
                    Validation::Valid(value) => cx.set_value(value)?,
                    Validation::Invalid => log::debug!(
                        "Not copying default size {}x{} into {}",
                        width,
                        height,
                        self.field.name
                    ),
                }
            }
            _ => {}
        }
        Ok(())
    }
}
