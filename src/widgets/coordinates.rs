//! x/y widget

use super::{check_digits, field_element, input_text, size_of};
use semform_core::{
    BoxedWidget, Capability, FormError, Input, Mount, Validation, Widget, WidgetCx,
};
use semform_types::{Field, ValidationError};
use serde_json::{Map, Value};

/// Two digit-only inputs stored as `{x, y}`, bounded by the size of the
/// field named in `max`
pub struct CoordinatesWidget {
    field: Field,
    x: String,
    y: String,
    max: Option<(u64, u64)>,
    errors: Vec<ValidationError>,
}

impl CoordinatesWidget {
    pub fn construct(
        cx: &mut WidgetCx<'_>,
        field: Field,
        params: Option<Value>,
    ) -> Result<BoxedWidget, FormError> {
        let params = params.as_ref();
        let x = input_text(params.and_then(|p| p.get("x")));
        let y = input_text(params.and_then(|p| p.get("y")));

        if let Some(path) = field.reference("max") {
            cx.follow("max", path, Capability::Size)?;
        }

        Ok(Box::new(Self {
            field,
            x,
            y,
            max: None,
            errors: Vec::new(),
        }))
    }
}

impl Widget for CoordinatesWidget {
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
            ("x", self.x.trim(), self.max.map(|m| m.0)),
            ("y", self.y.trim(), self.max.map(|m| m.1)),
        ];

        let mut point = Map::new();
        for (property, value, max) in inputs {
            match check_digits(value, property, self.field.optional, max) {
                Ok(Some(n)) => {
                    point.insert(property.to_string(), Value::from(n));
                }
                Ok(None) => {}
                Err(error) => {
                    self.errors.push(error);
                    return Validation::Invalid;
                }
            }
        }

        if point.is_empty() {
            Validation::Valid(None)
        } else {
            Validation::Valid(Some(Value::Object(point)))
        }
    }

    fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    fn handle(&mut self, cx: &mut WidgetCx<'_>, input: Input) -> Result<(), FormError> {
        let Input::Pair(x, y) = input else {
            log::debug!("coordinates widget ignores {:?}", input);
            return Ok(());
        };
        self.x = x;
        self.y = y;
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
        if attr != "max" {
            return Ok(());
        }
        let Some(size) = size_of(value) else {
            return Ok(());
        };
        self.max = Some(size);
        if cx.params().is_some() {
            self.validate();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::widgets::builtin_registry;
    use semform_core::{FormOptions, FormTree, Input, ValidationError};
    use semform_types::Field;
    use serde_json::{json, Value};

    fn build(params: Value) -> FormTree {
        let mut point = Field::new("point", "group").with_widget("coordinates");
        point.max = Some(json!("area"));
        let area = Field::new("area", "group").with_widget("dimensions");

        let mut tree = FormTree::new(builtin_registry(), params, FormOptions::default());
        tree.build(&[point, area]).unwrap();
        tree
    }

    #[test]
    fn test_bounded_by_referenced_size() {
        let mut tree = build(json!({"area": {"width": 800, "height": 600}}));
        let id = tree.find("point").unwrap();

        tree.input(id, Input::Pair("900".into(), "10".into())).unwrap();
        assert!(matches!(
            tree.errors(id),
            [ValidationError::ExceedsMax { property, max }] if property == "x" && *max == 800.0
        ));

        tree.input(id, Input::Pair("800".into(), "600".into())).unwrap();
        assert!(tree.errors(id).is_empty());
        assert_eq!(tree.params()["point"], json!({"x": 800, "y": 600}));
    }

    #[test]
    fn test_revalidates_when_max_shrinks() {
        let mut tree = build(json!({
            "area": {"width": 800, "height": 600},
            "point": {"x": 500, "y": 100}
        }));
        let point = tree.find("point").unwrap();
        let area = tree.find("area").unwrap();
        assert!(tree.errors(point).is_empty());

        tree.input(area, Input::Pair("400".into(), "300".into()))
            .unwrap();
        assert!(matches!(
            tree.errors(point),
            [ValidationError::ExceedsMax { property, .. }] if property == "x"
        ));
    }

    #[test]
    fn test_required() {
        let mut tree = build(json!({}));
        let id = tree.find("point").unwrap();
        tree.input(id, Input::Pair("".into(), "1".into())).unwrap();
        assert!(matches!(
            tree.errors(id),
            [ValidationError::Required { property }] if property == "x"
        ));
    }
}
