//! Minimal widget used by the engine's own tests

use crate::builder::ChildSlots;
use crate::error::FormError;
use crate::presentation::{Element, Mount};
use crate::registry::{Registry, WidgetType};
use crate::tree::{FormOptions, FormTree, WidgetId};
use crate::widget::{BoxedWidget, Capability, Input, Validation, Widget, WidgetCx};
use semform_types::{Field, UploadError, UploadResponse, UploadTicket, ValidationError};
use serde_json::Value;
use std::cell::RefCell;

thread_local! {
    static DELIVERIES: RefCell<Vec<(WidgetId, String, Option<Value>)>> = RefCell::new(Vec::new());
    static UPLOADS: RefCell<Vec<(WidgetId, UploadTicket, bool)>> = RefCell::new(Vec::new());
    static CONSTRUCTED: RefCell<Vec<(WidgetId, Option<Value>)>> = RefCell::new(Vec::new());
    static REMOVED: RefCell<Vec<WidgetId>> = RefCell::new(Vec::new());
    static ON_DELIVERY: RefCell<Option<DeliveryHook>> = RefCell::new(None);
}

type DeliveryHook = Box<dyn FnOnce(&mut FormTree)>;

/// Test widget: holds a text value, records everything delivered to it.
///
/// Kind `sized` provides the size capability, kind `text` the text one and
/// kind `invalid` never validates. Widget `stub-refs` follows its `max` and
/// `default` references, `stub-single` shares its params with its children.
pub struct Stub {
    id: WidgetId,
    field: Field,
    value: Option<Value>,
    errors: Vec<ValidationError>,
}

impl Stub {
    pub fn construct(
        cx: &mut WidgetCx<'_>,
        field: Field,
        params: Option<Value>,
    ) -> Result<BoxedWidget, FormError> {
        CONSTRUCTED.with(|c| c.borrow_mut().push((cx.id(), params.clone())));
        if field.widget_name() == "stub-refs" {
            for attr in ["max", "default"] {
                if let Some(path) = field.reference(attr) {
                    cx.follow(attr, path, Capability::Size)?;
                }
            }
        }
        Ok(Box::new(Stub {
            id: cx.id(),
            field,
            value: params,
            errors: Vec::new(),
        }))
    }

    /// Run `hook` on the tree inside the next delivery of a value
    pub fn on_next_delivery(hook: impl FnOnce(&mut FormTree) + 'static) {
        ON_DELIVERY.with(|h| *h.borrow_mut() = Some(Box::new(hook)));
    }

    pub fn removed() -> Vec<WidgetId> {
        REMOVED.with(|r| r.borrow().clone())
    }

    pub fn constructed_with(id: WidgetId, params: Option<Value>) -> bool {
        CONSTRUCTED.with(|c| c.borrow().iter().any(|entry| *entry == (id, params.clone())))
    }

    /// Upload results seen by a widget: ticket and whether it succeeded
    pub fn uploads(id: WidgetId) -> Vec<(UploadTicket, bool)> {
        UPLOADS.with(|u| {
            u.borrow()
                .iter()
                .filter(|(w, _, _)| *w == id)
                .map(|(_, t, ok)| (*t, *ok))
                .collect()
        })
    }
}

impl Widget for Stub {
    fn field(&self) -> &Field {
        &self.field
    }

    fn attach(&mut self, cx: &mut WidgetCx<'_>, mount: Mount) -> Result<(), FormError> {
        let id = cx.id();
        cx.mount(
            mount,
            Element::new(id, format!("field {}", self.field.kind))
                .with_label(self.field.display_label()),
        );
        if !self.field.fields.is_empty() {
            let slots = if self.field.widget_name() == "stub-single" {
                ChildSlots::Shared(cx.slot())
            } else {
                ChildSlots::Keyed(cx.slot())
            };
            let fields = self.field.fields.clone();
            cx.build_children(&fields, slots, Mount::Content(id))?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Validation {
        self.errors.clear();
        if self.field.kind == "invalid" {
            self.errors.push(ValidationError::Required {
                property: self.field.name.clone(),
            });
            return Validation::Invalid;
        }
        Validation::Valid(self.value.clone())
    }

    fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    fn provides(&self, capability: Capability) -> bool {
        match capability {
            Capability::Size => self.field.kind == "sized",
            Capability::Text => self.field.kind == "text",
        }
    }

    fn handle(&mut self, cx: &mut WidgetCx<'_>, input: Input) -> Result<(), FormError> {
        if let Input::Text(text) = input {
            self.value = Some(Value::String(text));
            cx.set_value(self.value.clone())?;
        }
        Ok(())
    }

    fn reference_changed(
        &mut self,
        cx: &mut WidgetCx<'_>,
        attr: &str,
        value: Option<&Value>,
    ) -> Result<(), FormError> {
        DELIVERIES.with(|d| {
            d.borrow_mut()
                .push((cx.id(), attr.to_string(), value.cloned()))
        });
        if value.is_some() {
            if let Some(hook) = ON_DELIVERY.with(|h| h.borrow_mut().take()) {
                hook(cx.tree_mut());
            }
        }
        Ok(())
    }

    fn upload_finished(
        &mut self,
        _cx: &mut WidgetCx<'_>,
        ticket: UploadTicket,
        result: Result<UploadResponse, UploadError>,
    ) -> Result<(), FormError> {
        UPLOADS.with(|u| u.borrow_mut().push((self.id, ticket, result.is_ok())));
        Ok(())
    }

    fn remove(&mut self, cx: &mut WidgetCx<'_>) {
        REMOVED.with(|r| r.borrow_mut().push(cx.id()));
    }
}

/// Everything delivered to `id`, as (attribute, value)
pub fn deliveries(id: WidgetId) -> Vec<(String, Option<Value>)> {
    DELIVERIES.with(|d| {
        d.borrow()
            .iter()
            .filter(|(w, _, _)| *w == id)
            .map(|(_, attr, value)| (attr.clone(), value.clone()))
            .collect()
    })
}

pub fn stub_registry() -> Registry {
    let mut registry = Registry::new();
    for name in ["stub", "sized", "text", "invalid", "group", "stub-single"] {
        registry.register(name, WidgetType::new(Stub::construct));
    }
    registry.register(
        "stub-refs",
        WidgetType::new(Stub::construct).with_references(&["max", "default"]),
    );
    registry
}

/// Fresh stub tree; also forgets what earlier trees on this thread recorded
pub fn stub_tree(params: Value) -> FormTree {
    DELIVERIES.with(|d| d.borrow_mut().clear());
    UPLOADS.with(|u| u.borrow_mut().clear());
    CONSTRUCTED.with(|c| c.borrow_mut().clear());
    REMOVED.with(|r| r.borrow_mut().clear());
    ON_DELIVERY.with(|h| *h.borrow_mut() = None);
    FormTree::new(stub_registry(), params, FormOptions::default())
}
