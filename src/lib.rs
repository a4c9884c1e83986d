//! semform: Schema-driven form widget trees
//!
//! This library builds an editable form from declarative semantics:
//! - Built-in widgets (text, number, group, file, ...) registered by name
//! - A `Form` owning the widget tree and the params it edits
//! - A library selector switching between content libraries
//! - Configuration management and a directory-backed uploader
//!
//! The widget tree engine itself lives in `semform-core`.

pub mod config;
pub mod form;
pub mod library_selector;
pub mod upload;
pub mod widgets;

// Re-export commonly used types
pub use config::EditorConfig;
pub use form::Form;
pub use library_selector::{Library, LibrarySelector, SemanticsLoader};
pub use semform_core::{FormError, Input, ValidationError, WidgetId};
