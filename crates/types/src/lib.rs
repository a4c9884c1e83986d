//! semform-types: Shared data types for semform.
//!
//! This crate contains pure data types (field schema, params paths, upload
//! messages and validation errors) shared by the widget tree engine and the
//! built-in widgets. Nothing in here knows about widget instances.

pub mod field;
pub mod params;
pub mod upload;
pub mod validation;

// Re-export commonly used types at the crate root for convenience
pub use field::{parse_semantics, Field, Label, ReferencePath, Regexp};
pub use params::ParamsPath;
pub use upload::{UploadError, UploadFile, UploadRequest, UploadResponse, UploadTicket};
pub use validation::ValidationError;
