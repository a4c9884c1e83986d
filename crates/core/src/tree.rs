//! The live widget tree
//!
//! Widgets live in an arena indexed by [`WidgetId`]. Children are owned
//! top-down through the arena; parent links are plain ids. A widget is taken
//! out of its slot while one of its methods runs, so re-entrant deliveries
//! (a change pushed back to the widget that caused it) are queued in the
//! node's inbox and replayed when the widget is put back.

use crate::error::FormError;
use crate::notifier::{ChangeNotifier, SubscriptionId};
use crate::presentation::{Mount, Presentation};
use crate::ready::{self, ReadyQueue};
use crate::registry::Registry;
use crate::resolver::Reference;
use crate::upload::Uploader;
use crate::widget::{BoxedWidget, Capability, Input, Widget, WidgetCx};
use semform_types::{Field, ParamsPath, UploadError, UploadResponse, UploadTicket, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

/// Index of a widget in its tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub(crate) usize);

impl WidgetId {
    /// The implicit container holding top-level fields
    pub const ROOT: WidgetId = WidgetId(0);

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which params object a slot points into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsRoot {
    /// The form's params
    Form,
    /// Scratch params owned by a widget
    Local(WidgetId),
}

/// Location of a widget's params
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamsSlot {
    pub root: ParamsRoot,
    pub path: ParamsPath,
}

impl ParamsSlot {
    pub fn form_root() -> Self {
        Self {
            root: ParamsRoot::Form,
            path: ParamsPath::root(),
        }
    }

    pub fn local(owner: WidgetId) -> Self {
        Self {
            root: ParamsRoot::Local(owner),
            path: ParamsPath::root(),
        }
    }

    pub fn child(&self, name: &str) -> Self {
        Self {
            root: self.root.clone(),
            path: self.path.child(name),
        }
    }
}

/// Form-wide settings widgets read while building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    /// Longest group summary before it is cut with "..."
    pub summary_max_length: usize,
    /// Accepted mime types for image fields without their own list
    pub image_mimes: Vec<String>,
    /// Passed along with upload requests
    pub content_id: Option<String>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            summary_max_length: 48,
            image_mimes: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
            ],
            content_id: None,
        }
    }
}

/// Called after every write to the form params
pub type OnChangeCallback = Rc<RefCell<Option<Box<dyn Fn(&ParamsPath, Option<&Value>)>>>>;

#[derive(Debug, Clone)]
pub(crate) struct Subscriber {
    pub target: WidgetId,
    pub attr: String,
    /// Delivered instead of an absent value
    pub fallback: Option<Value>,
}

pub(crate) enum Delivery {
    Reference {
        attr: String,
        value: Option<Value>,
    },
    Upload {
        ticket: UploadTicket,
        result: Result<UploadResponse, UploadError>,
    },
}

pub(crate) struct Node {
    pub widget: Option<BoxedWidget>,
    pub parent: Option<WidgetId>,
    pub children: Vec<WidgetId>,
    pub name: String,
    pub slot: ParamsSlot,
    pub notifier: ChangeNotifier<Subscriber>,
    pub references: HashMap<String, Reference>,
    /// Subscriptions this widget holds on other widgets
    pub subscriptions: Vec<(WidgetId, SubscriptionId)>,
    pub inbox: VecDeque<Delivery>,
}

impl Node {
    pub fn new(parent: Option<WidgetId>, name: String, slot: ParamsSlot) -> Self {
        Self {
            widget: None,
            parent,
            children: Vec::new(),
            name,
            slot,
            notifier: ChangeNotifier::new(),
            references: HashMap::new(),
            subscriptions: Vec::new(),
            inbox: VecDeque::new(),
        }
    }
}

/// A tree of widgets built from semantics, together with the params it edits
pub struct FormTree {
    pub(crate) nodes: Vec<Option<Node>>,
    pub(crate) registry: Registry,
    pub(crate) params: Value,
    pub(crate) locals: HashMap<WidgetId, Value>,
    pub(crate) ready: ReadyQueue<FormTree>,
    pub(crate) presentation: Presentation,
    pub(crate) options: FormOptions,
    pub(crate) uploader: Option<Box<dyn Uploader>>,
    pub(crate) tickets: HashMap<UploadTicket, WidgetId>,
    pub(crate) next_ticket: u64,
    on_change: OnChangeCallback,
}

impl FormTree {
    /// Create an empty tree editing `params` (anything but an object is
    /// replaced by an empty one)
    pub fn new(registry: Registry, params: Value, options: FormOptions) -> Self {
        let params = if params.is_object() {
            params
        } else {
            Value::Object(Map::new())
        };
        Self {
            nodes: vec![Some(Node::new(None, String::new(), ParamsSlot::form_root()))],
            registry,
            params,
            locals: HashMap::new(),
            ready: ReadyQueue::new(),
            presentation: Presentation::new(),
            options,
            uploader: None,
            tickets: HashMap::new(),
            next_ticket: 1,
            on_change: Rc::new(RefCell::new(None)),
        }
    }

    /// Build `fields` as top-level widgets mounted at the form root
    pub fn build(&mut self, fields: &[Field]) -> Result<Vec<WidgetId>, FormError> {
        self.build_fields(
            WidgetId::ROOT,
            fields,
            crate::builder::ChildSlots::Keyed(ParamsSlot::form_root()),
            Mount::Root,
        )
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut Presentation {
        &mut self.presentation
    }

    /// Register a callback run after every write to the form params
    pub fn on_change(&self, callback: impl Fn(&ParamsPath, Option<&Value>) + 'static) {
        *self.on_change.borrow_mut() = Some(Box::new(callback));
    }

    // ---- node access ----

    pub(crate) fn node(&self, id: WidgetId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: WidgetId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub(crate) fn alloc(&mut self, parent: WidgetId, name: &str, slot: ParamsSlot) -> WidgetId {
        let id = WidgetId(self.nodes.len());
        self.nodes
            .push(Some(Node::new(Some(parent), name.to_string(), slot)));
        if let Some(parent) = self.node_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.node(id).is_some()
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn name(&self, id: WidgetId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    pub fn slot(&self, id: WidgetId) -> Option<&ParamsSlot> {
        self.node(id).map(|n| &n.slot)
    }

    /// The widget, unless it is missing or currently busy handling a call
    pub fn widget(&self, id: WidgetId) -> Option<&dyn Widget> {
        self.node(id).and_then(|n| n.widget.as_deref())
    }

    pub fn errors(&self, id: WidgetId) -> &[ValidationError] {
        self.widget(id).map(|w| w.errors()).unwrap_or(&[])
    }

    pub fn provides(&self, id: WidgetId, capability: Capability) -> bool {
        self.widget(id).map_or(false, |w| w.provides(capability))
    }

    /// Human readable location of a widget, e.g. `/group/title`
    pub fn path_of(&self, id: WidgetId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == WidgetId::ROOT {
                break;
            }
            match self.node(node_id) {
                Some(node) => {
                    names.push(node.name.clone());
                    current = node.parent;
                }
                None => break,
            }
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// Find a widget by its `/`-separated name path from the root
    pub fn find(&self, path: &str) -> Option<WidgetId> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(WidgetId::ROOT, |scope, name| self.child_named(scope, name))
    }

    pub(crate) fn child_named(&self, scope: WidgetId, name: &str) -> Option<WidgetId> {
        self.children(scope)
            .iter()
            .copied()
            .find(|child| self.name(*child) == Some(name))
    }

    /// Visit the direct children of a widget in schema order
    pub fn for_each_child(&self, id: WidgetId, mut f: impl FnMut(WidgetId, &dyn Widget)) {
        for child in self.children(id) {
            if let Some(widget) = self.widget(*child) {
                f(*child, widget);
            }
        }
    }

    /// Every live widget below `id` (excluded), depth first in schema order
    pub fn descendants(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        for child in self.children(id) {
            out.push(*child);
            out.extend(self.descendants(*child));
        }
        out
    }

    // ---- params ----

    pub fn read_slot(&self, slot: &ParamsSlot) -> Option<Value> {
        let root = match &slot.root {
            ParamsRoot::Form => &self.params,
            ParamsRoot::Local(owner) => self.locals.get(owner)?,
        };
        slot.path.get(root).cloned()
    }

    /// Write a slot without notifying anyone
    pub(crate) fn write_slot(
        &mut self,
        slot: &ParamsSlot,
        value: Option<Value>,
    ) -> Result<(), FormError> {
        match &slot.root {
            ParamsRoot::Form => {
                slot.path.set(&mut self.params, value);
                let callback = Rc::clone(&self.on_change);
                if let Some(callback) = callback.borrow().as_ref() {
                    callback(&slot.path, slot.path.get(&self.params));
                }
                Ok(())
            }
            ParamsRoot::Local(owner) => {
                let owner = *owner;
                let local = self
                    .locals
                    .entry(owner)
                    .or_insert_with(|| Value::Object(Map::new()));
                slot.path.set(local, value);

                // the owner decides what to do with its scratch params
                let Some(key) = slot.path.first().map(str::to_string) else {
                    return Ok(());
                };
                let current = self
                    .locals
                    .get(&owner)
                    .and_then(|local| local.get(&key))
                    .cloned();
                self.deliver(
                    owner,
                    Delivery::Reference {
                        attr: key,
                        value: current,
                    },
                )
            }
        }
    }

    /// Current params of a widget
    pub fn value_of(&self, id: WidgetId) -> Option<Value> {
        self.slot(id).and_then(|slot| self.read_slot(slot))
    }

    pub(crate) fn set_value(&mut self, id: WidgetId, value: Option<Value>) -> Result<(), FormError> {
        let slot = self
            .slot(id)
            .cloned()
            .ok_or(FormError::WidgetUnavailable(id))?;
        self.write_slot(&slot, value.clone())?;
        self.notify(id, value)
    }

    pub fn local(&self, owner: WidgetId) -> Option<&Value> {
        self.locals.get(&owner)
    }

    pub(crate) fn set_local(&mut self, owner: WidgetId, value: Value) {
        self.locals.insert(owner, value);
    }

    // ---- widget calls ----

    /// Run `f` on a widget, checked out of the tree for the duration
    pub(crate) fn with_widget<R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Widget, &mut WidgetCx<'_>) -> Result<R, FormError>,
    ) -> Result<R, FormError> {
        let mut widget = self
            .node_mut(id)
            .and_then(|node| node.widget.take())
            .ok_or(FormError::WidgetUnavailable(id))?;

        let result = {
            let mut cx = WidgetCx { tree: self, id };
            f(widget.as_mut(), &mut cx)
        };

        match self.node_mut(id) {
            Some(node) => node.widget = Some(widget),
            // removed itself while running
            None => return result,
        }
        let flushed = self.flush_inbox(id);
        let value = result?;
        flushed?;
        Ok(value)
    }

    pub(crate) fn deliver(&mut self, id: WidgetId, delivery: Delivery) -> Result<(), FormError> {
        let Some(node) = self.node_mut(id) else {
            log::debug!("Dropping delivery to removed widget {}", id);
            return Ok(());
        };
        if node.widget.is_none() {
            node.inbox.push_back(delivery);
            return Ok(());
        }
        self.with_widget(id, |widget, cx| match delivery {
            Delivery::Reference { attr, value } => widget.reference_changed(cx, &attr, value.as_ref()),
            Delivery::Upload { ticket, result } => widget.upload_finished(cx, ticket, result),
        })
    }

    pub(crate) fn flush_inbox(&mut self, id: WidgetId) -> Result<(), FormError> {
        loop {
            let Some(node) = self.node_mut(id) else {
                return Ok(());
            };
            if node.widget.is_none() {
                return Ok(());
            }
            let Some(delivery) = node.inbox.pop_front() else {
                return Ok(());
            };
            self.deliver(id, delivery)?;
        }
    }

    /// Deliver a user interaction to a widget
    pub fn input(&mut self, id: WidgetId, input: Input) -> Result<(), FormError> {
        log::debug!("Input for {}: {:?}", self.path_of(id), input);
        self.with_widget(id, |widget, cx| widget.handle(cx, input))
    }

    // ---- change notification ----

    /// Push `value` to every subscriber of `id`, in subscription order
    pub(crate) fn notify(&mut self, id: WidgetId, value: Option<Value>) -> Result<(), FormError> {
        let subscribers = match self.node(id) {
            Some(node) if !node.notifier.is_empty() => node.notifier.snapshot(),
            _ => return Ok(()),
        };
        for (sub_id, sub) in subscribers {
            let still_subscribed = self
                .node(id)
                .map_or(false, |node| node.notifier.contains(sub_id));
            if !still_subscribed {
                continue;
            }
            let value = value.clone().or_else(|| sub.fallback.clone());
            self.deliver(
                sub.target,
                Delivery::Reference {
                    attr: sub.attr,
                    value,
                },
            )?;
        }
        Ok(())
    }

    /// Subscribe `consumer` to changes of `target`; the current value is
    /// delivered right away
    pub(crate) fn subscribe(
        &mut self,
        consumer: WidgetId,
        target: WidgetId,
        attr: &str,
        fallback: Option<Value>,
    ) -> Result<SubscriptionId, FormError> {
        let subscriber = Subscriber {
            target: consumer,
            attr: attr.to_string(),
            fallback: fallback.clone(),
        };
        let sub_id = self
            .node_mut(target)
            .ok_or(FormError::WidgetUnavailable(target))?
            .notifier
            .subscribe(subscriber);
        if let Some(node) = self.node_mut(consumer) {
            node.subscriptions.push((target, sub_id));
        }
        log::debug!(
            "{} follows {} as {}",
            self.path_of(consumer),
            self.path_of(target),
            attr
        );

        let current = self.value_of(target).or(fallback);
        self.deliver(
            consumer,
            Delivery::Reference {
                attr: attr.to_string(),
                value: current,
            },
        )?;
        Ok(sub_id)
    }

    /// Number of subscribers currently following `id`
    pub fn subscriber_count(&self, id: WidgetId) -> usize {
        self.node(id).map_or(0, |node| node.notifier.len())
    }

    // ---- ready queue ----

    fn ready_queue(tree: &mut FormTree) -> &mut ReadyQueue<FormTree> {
        &mut tree.ready
    }

    /// Run `task` once the tree finished its initial construction; right
    /// away if it already has
    pub fn ready<F>(&mut self, task: F) -> Result<(), FormError>
    where
        F: FnOnce(&mut FormTree) -> Result<(), FormError> + 'static,
    {
        if self.ready.is_settled() {
            task(self)
        } else {
            self.ready.push(Box::new(task));
            Ok(())
        }
    }

    /// True while a construction pass is open or deferred tasks are running
    pub fn is_building(&self) -> bool {
        !self.ready.is_settled()
    }

    pub(crate) fn drain_ready(&mut self) -> Result<(), FormError> {
        ready::drain(self, Self::ready_queue)
    }

    // ---- removal ----

    /// Destroy a widget and its subtree: children first, then the widget's
    /// own presentation, subscriptions and pending uploads
    pub fn remove(&mut self, id: WidgetId) {
        if id == WidgetId::ROOT {
            for child in self.children(id).to_vec() {
                self.remove(child);
            }
            return;
        }
        if !self.contains(id) {
            return;
        }

        for child in self.children(id).to_vec() {
            self.remove(child);
        }

        if self.widget(id).is_some() {
            let removed = self.with_widget(id, |widget, cx| {
                widget.remove(cx);
                Ok(())
            });
            if let Err(e) = removed {
                log::warn!("Error while removing widget {}: {}", id, e);
            }
        }

        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        for (target, sub_id) in node.subscriptions {
            if let Some(target) = self.node_mut(target) {
                target.notifier.unsubscribe(sub_id);
            }
        }
        if let Some(parent) = node.parent.and_then(|p| self.node_mut(p)) {
            parent.children.retain(|child| *child != id);
        }
        self.presentation.unmount(id);
        self.locals.remove(&id);
        self.tickets.retain(|_, owner| *owner != id);
        log::debug!("Removed widget {} ({})", id, node.name);
    }

    /// Remove every widget, leaving an empty tree over the same params
    pub fn clear(&mut self) {
        self.remove(WidgetId::ROOT);
    }
}

impl fmt::Debug for FormTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormTree")
            .field("widgets", &self.nodes.iter().filter(|n| n.is_some()).count())
            .field("params", &self.params)
            .finish()
    }
}
