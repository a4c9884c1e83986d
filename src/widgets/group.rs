//! Collapsible group of fields

use super::unescape_html;
use once_cell::sync::Lazy;
use regex::Regex;
use semform_core::{
    BoxedWidget, Capability, ChildSlots, Element, FormError, Input, Mount, Validation, Widget,
    WidgetCx,
};
use semform_types::{Field, ValidationError};
use serde_json::{json, Value};

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex"));

/// Groups hold their children's params in an object keyed by child name.
/// A group with a single child passes its own params straight through
/// instead.
///
/// The title shows the label, followed by the value of the first text
/// child once there is one.
pub struct GroupWidget {
    field: Field,
    expanded: bool,
    summary: Option<String>,
}

impl GroupWidget {
    pub fn construct(
        cx: &mut WidgetCx<'_>,
        mut field: Field,
        mut params: Option<Value>,
    ) -> Result<BoxedWidget, FormError> {
        if field.deprecated {
            prune_deprecated(cx, &mut field, &mut params)?;
        }
        if field.optional {
            field.force_optional();
        }
        if field.fields.len() > 1 && params.is_none() {
            cx.set_value(Some(json!({})))?;
        }

        Ok(Box::new(Self {
            expanded: field.expanded,
            field,
            summary: None,
        }))
    }

    fn title(&self, max_length: usize) -> String {
        let label = self.field.display_label();
        let Some(summary) = &self.summary else {
            return label;
        };
        if summary.chars().count() > max_length {
            let cut: String = summary.chars().take(max_length.saturating_sub(3)).collect();
            format!("{}: {}...", label, cut)
        } else {
            format!("{}: {}", label, summary)
        }
    }

    fn set_expanded(&mut self, cx: &mut WidgetCx<'_>, expanded: bool) {
        self.expanded = expanded;
        if let Some(element) = cx.element_mut() {
            element.expanded = expanded;
        }
    }

    fn collapse(&mut self, cx: &mut WidgetCx<'_>) {
        if cx.validate_children() {
            self.set_expanded(cx, false);
        } else {
            log::debug!("Not collapsing {} while it has errors", self.field.name);
        }
    }
}

/// Drop empty strings from a deprecated group's params and hide every child
/// without a value. A group left with nothing to show loses all its fields.
fn prune_deprecated(
    cx: &mut WidgetCx<'_>,
    field: &mut Field,
    params: &mut Option<Value>,
) -> Result<(), FormError> {
    if let Some(Value::Object(map)) = params.as_mut() {
        let before = map.len();
        map.retain(|name, value| {
            !(value.as_str() == Some("") && field.fields.iter().any(|f| &f.name == name))
        });
        if map.len() != before {
            cx.set_value(params.clone())?;
        }
    }

    let mut hidden = 0;
    for child in &mut field.fields {
        if params.as_ref().and_then(|p| p.get(&child.name)).is_none() {
            child.widget = Some("none".to_string());
            hidden += 1;
        }
    }
    if hidden == field.fields.len() {
        field.fields.clear();
    }
    Ok(())
}

/// Plain text of a child value for the title
fn summary_text(value: &str) -> String {
    unescape_html(&TAGS.replace_all(value, "")).trim().to_string()
}

impl Widget for GroupWidget {
    fn field(&self) -> &Field {
        &self.field
    }

    fn attach(&mut self, cx: &mut WidgetCx<'_>, mount: Mount) -> Result<(), FormError> {
        if self.field.fields.is_empty() {
            // nothing left to edit
            return cx.set_value(None);
        }

        let id = cx.id();
        let single = self.field.fields.len() == 1;
        let mut element = Element::new(id, "field group")
            .with_label(self.field.display_label())
            .with_description(self.field.description.clone());
        if single {
            element.add_class("single");
        }
        element.expanded = self.expanded;
        element.title = Some(self.title(cx.options().summary_max_length));
        cx.mount(mount, element);

        let slots = if single {
            ChildSlots::Shared(cx.slot())
        } else {
            ChildSlots::Keyed(cx.slot())
        };
        let children = cx.build_children(&self.field.fields, slots, Mount::Content(id))?;

        if let Some(source) = children
            .into_iter()
            .find(|child| cx.provides(*child, Capability::Text))
        {
            cx.subscribe(source, "summary")?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Validation {
        // children hold the values
        Validation::Valid(None)
    }

    fn errors(&self) -> &[ValidationError] {
        &[]
    }

    fn handle(&mut self, cx: &mut WidgetCx<'_>, input: Input) -> Result<(), FormError> {
        match input {
            Input::Toggle if self.expanded => self.collapse(cx),
            Input::Toggle | Input::Expand => self.set_expanded(cx, true),
            Input::Collapse => self.collapse(cx),
            other => log::debug!("group widget ignores {:?}", other),
        }
        Ok(())
    }

    fn reference_changed(
        &mut self,
        cx: &mut WidgetCx<'_>,
        attr: &str,
        value: Option<&Value>,
    ) -> Result<(), FormError> {
        if attr != "summary" {
            return Ok(());
        }
        let Some(summary) = value
            .and_then(Value::as_str)
            .map(summary_text)
            .filter(|s| !s.is_empty())
        else {
            return Ok(());
        };
        self.summary = Some(summary);

        let title = self.title(cx.options().summary_max_length);
        if let Some(element) = cx.element_mut() {
            element.title = Some(title);
        }
        Ok(())
    }
}
