//! semform-core: Widget tree engine for semform.
//!
//! This crate contains the [`Widget`] trait, the widget [`Registry`], and the
//! [`FormTree`] that builds widgets from semantics, resolves references
//! between fields, runs deferred initialization and aggregates validation.
//! Concrete widgets live in the `semform` crate.

mod builder;
mod error;
mod notifier;
mod presentation;
mod ready;
mod registry;
mod resolver;
mod tree;
mod upload;
mod validate;
mod widget;

#[cfg(test)]
mod testing;

pub use builder::ChildSlots;
pub use error::FormError;
pub use notifier::{ChangeNotifier, SubscriptionId};
pub use presentation::{Element, Mount, Presentation};
pub use ready::{drain, ReadyQueue, ReadyTask};
pub use registry::{
    global_registry, register, reset_registry, resolve, Registry, WidgetFactory, WidgetType,
};
pub use resolver::Reference;
pub use tree::{FormOptions, FormTree, OnChangeCallback, ParamsRoot, ParamsSlot, WidgetId};
pub use upload::{RecordingUploader, Uploader};
pub use widget::{BoxedWidget, Capability, Input, Validation, Widget, WidgetCx};

// Re-export types used in trait signatures for convenience
pub use semform_types::{Field, ReferencePath, UploadError, UploadResponse, UploadTicket};
pub use semform_types::{ParamsPath, ValidationError};
