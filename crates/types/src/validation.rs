//! Recoverable, per-widget validation errors

use crate::upload::UploadError;
use thiserror::Error;

/// One problem with a widget's current input.
///
/// These are collected in the widget's error list and never abort validation
/// of sibling widgets.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("The {property} field is required and must have a value.")]
    Required { property: String },

    #[error("The value is too long, it may contain {max} letters or less.")]
    TooLong { max: usize },

    #[error("The value has an invalid format.")]
    InvalidFormat,

    #[error("{property} field may only contain numbers.")]
    OnlyNumbers { property: String },

    #[error("{property} exceeds the maximum value of {max}.")]
    ExceedsMax { property: String, max: f64 },

    #[error("{property} is below the minimum value of {min}.")]
    BelowMin { property: String, min: f64 },

    #[error("{property} can only be changed in steps of {step}.")]
    OutOfStep { property: String, step: f64 },

    #[error(transparent)]
    Upload(#[from] UploadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ValidationError::ExceedsMax {
            property: "X".into(),
            max: 800.0,
        };
        assert_eq!(err.to_string(), "X exceeds the maximum value of 800.");

        let err: ValidationError = UploadError::Rejected("nope".into()).into();
        assert_eq!(err.to_string(), "nope");
    }
}
