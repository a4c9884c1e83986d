//! Widget for fields that are kept but never shown

use semform_core::{BoxedWidget, FormError, Mount, Validation, Widget, WidgetCx};
use semform_types::{Field, ValidationError};
use serde_json::Value;

/// Shows nothing and leaves its params untouched
pub struct NoneWidget {
    field: Field,
}

impl NoneWidget {
    pub fn construct(
        _cx: &mut WidgetCx<'_>,
        field: Field,
        _params: Option<Value>,
    ) -> Result<BoxedWidget, FormError> {
        Ok(Box::new(Self { field }))
    }
}

impl Widget for NoneWidget {
    fn field(&self) -> &Field {
        &self.field
    }

    fn attach(&mut self, _cx: &mut WidgetCx<'_>, _mount: Mount) -> Result<(), FormError> {
        Ok(())
    }

    fn validate(&mut self) -> Validation {
        Validation::Valid(None)
    }

    fn errors(&self) -> &[ValidationError] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use crate::widgets::builtin_registry;
    use semform_core::{FormOptions, FormTree, Mount};
    use semform_types::Field;
    use serde_json::json;

    #[test]
    fn test_hidden_and_untouched() {
        let mut tree =
            FormTree::new(builtin_registry(), json!({"old": "keep"}), FormOptions::default());
        tree.build(&[Field::new("old", "text").with_widget("none")])
            .unwrap();
        assert!(tree.presentation().elements(Mount::Root).is_empty());
        assert!(tree.validate_all());
        assert_eq!(tree.params(), &json!({"old": "keep"}));
    }
}
