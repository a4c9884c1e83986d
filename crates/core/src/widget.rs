//! Widget trait and the context handed to widgets

use crate::builder::ChildSlots;
use crate::error::FormError;
use crate::presentation::{Element, Mount};
use crate::tree::{FormOptions, FormTree, ParamsSlot, WidgetId};
use semform_types::{Field, ReferencePath, UploadError, UploadFile, UploadRequest, UploadResponse};
use semform_types::{UploadTicket, ValidationError};
use serde_json::Value;
use std::fmt;

/// What a referenced field must be able to provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Exposes `width`/`height` in its value
    Size,
    /// Holds a plain text value
    Text,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Size => write!(f, "size"),
            Capability::Text => write!(f, "text"),
        }
    }
}

/// Outcome of validating a widget's current input
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// Canonical value, absent for a cleared optional field
    Valid(Option<Value>),
    Invalid,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Validation::Valid(value) => value,
            Validation::Invalid => None,
        }
    }
}

/// A user interaction delivered to a widget
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// New contents of a text-like input
    Text(String),
    /// Both inputs of a two-value widget (width/height, x/y)
    Pair(String, String),
    Check(bool),
    Toggle,
    Expand,
    Collapse,
    Upload(UploadFile),
    RemoveFile,
}

/// Trait for all form widgets
///
/// A widget is created by its registered factory, then attached to a mount
/// point. Construction must not touch the presentation; `attach` builds it.
pub trait Widget {
    /// Schema node this widget was built from
    fn field(&self) -> &Field;

    /// Build and mount the presentation
    fn attach(&mut self, cx: &mut WidgetCx<'_>, mount: Mount) -> Result<(), FormError>;

    /// Check the current input.
    ///
    /// Clears the previous error list first; on failure the new errors are
    /// available through [`Widget::errors`].
    fn validate(&mut self) -> Validation;

    /// Errors from the last validation (or failed upload)
    fn errors(&self) -> &[ValidationError];

    /// Whether this widget can satisfy a reference requiring `capability`
    fn provides(&self, _capability: Capability) -> bool {
        false
    }

    /// Handle a user interaction
    fn handle(&mut self, _cx: &mut WidgetCx<'_>, input: Input) -> Result<(), FormError> {
        log::debug!(
            "{} widget ignores input {:?}",
            self.field().widget_name(),
            input
        );
        Ok(())
    }

    /// A followed field (or subscribed child) changed
    fn reference_changed(
        &mut self,
        _cx: &mut WidgetCx<'_>,
        _attr: &str,
        _value: Option<&Value>,
    ) -> Result<(), FormError> {
        Ok(())
    }

    /// The uploader finished a request made by this widget
    fn upload_finished(
        &mut self,
        _cx: &mut WidgetCx<'_>,
        _ticket: UploadTicket,
        _result: Result<UploadResponse, UploadError>,
    ) -> Result<(), FormError> {
        Ok(())
    }

    /// Called before the widget is dropped from the tree
    fn remove(&mut self, _cx: &mut WidgetCx<'_>) {}
}

/// Type-erased widget for dynamic dispatch
pub type BoxedWidget = Box<dyn Widget>;

/// A widget's handle on the tree it lives in.
///
/// The widget itself is checked out of the tree while it holds a context, so
/// anything delivered to it in the meantime is queued and replayed afterwards.
pub struct WidgetCx<'a> {
    pub(crate) tree: &'a mut FormTree,
    pub(crate) id: WidgetId,
}

impl<'a> WidgetCx<'a> {
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// Parent of this widget, the tree root for top-level fields
    pub fn parent(&self) -> WidgetId {
        self.tree.parent(self.id).unwrap_or(WidgetId::ROOT)
    }

    pub fn tree(&self) -> &FormTree {
        self.tree
    }

    pub fn tree_mut(&mut self) -> &mut FormTree {
        self.tree
    }

    pub fn options(&self) -> &FormOptions {
        self.tree.options()
    }

    /// Where this widget's params live
    pub fn slot(&self) -> ParamsSlot {
        self.tree
            .slot(self.id)
            .cloned()
            .unwrap_or_else(ParamsSlot::form_root)
    }

    /// Current params of this widget
    pub fn params(&self) -> Option<Value> {
        self.tree.value_of(self.id)
    }

    /// The change channel: write (or clear) this widget's params and push the
    /// new value to every subscriber
    pub fn set_value(&mut self, value: Option<Value>) -> Result<(), FormError> {
        self.tree.set_value(self.id, value)
    }

    /// Scratch params rooted at this widget, for sub-forms that must not
    /// write into the form until their owner decides to
    pub fn local(&self) -> Option<&Value> {
        self.tree.local(self.id)
    }

    pub fn set_local(&mut self, value: Value) {
        self.tree.set_local(self.id, value);
    }

    /// Run `task` once the tree finished its initial construction
    pub fn ready<F>(&mut self, task: F) -> Result<(), FormError>
    where
        F: FnOnce(&mut FormTree) -> Result<(), FormError> + 'static,
    {
        self.tree.ready(task)
    }

    /// Follow the field named by `path`, delivering its value to
    /// [`Widget::reference_changed`] under `attr` now and on every change
    pub fn follow(
        &mut self,
        attr: &str,
        path: ReferencePath,
        expected: Capability,
    ) -> Result<(), FormError> {
        self.tree.follow(self.id, attr, path, expected)
    }

    /// Subscribe to changes of `target`, delivered under `attr`
    pub fn subscribe(&mut self, target: WidgetId, attr: &str) -> Result<(), FormError> {
        self.tree.subscribe(self.id, target, attr, None).map(|_| ())
    }

    pub fn provides(&self, target: WidgetId, capability: Capability) -> bool {
        self.tree.provides(target, capability)
    }

    /// Build child widgets for `fields` below this widget
    pub fn build_children(
        &mut self,
        fields: &[Field],
        slots: ChildSlots,
        mount: Mount,
    ) -> Result<Vec<WidgetId>, FormError> {
        self.tree.build_fields(self.id, fields, slots, mount)
    }

    pub fn children(&self) -> Vec<WidgetId> {
        self.tree.children(self.id).to_vec()
    }

    /// Validate every child subtree, reporting whether all are valid
    pub fn validate_children(&mut self) -> bool {
        let mut valid = true;
        for child in self.children() {
            valid &= self.tree.validate_subtree(child);
        }
        valid
    }

    pub fn mount(&mut self, mount: Mount, element: Element) {
        self.tree.presentation_mut().mount(mount, element);
    }

    /// This widget's mounted element, if it has one
    pub fn element_mut(&mut self) -> Option<&mut Element> {
        let id = self.id;
        self.tree.presentation_mut().element_mut(id)
    }

    pub fn unmount(&mut self) {
        let id = self.id;
        self.tree.presentation_mut().unmount(id);
    }

    /// Hand a file to the uploader on behalf of this widget
    pub fn submit_upload(
        &mut self,
        field: &Field,
        accept: Vec<String>,
        file: UploadFile,
    ) -> Result<UploadTicket, UploadError> {
        let request = UploadRequest {
            field: field.clone(),
            content_id: self.tree.options().content_id.clone(),
            accept,
            file,
        };
        self.tree.submit_upload(self.id, request)
    }
}
