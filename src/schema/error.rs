// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Raised while turning an attribute declaration into a [`super::Node`].
///
/// These are programming errors in a module definition, never user-input
/// problems, and surface at registration time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("attribute `{path}`: unknown valType `{val_type}`")]
    UnknownValType { path: String, val_type: String },

    #[error("attribute `{path}`: valType `{val_type}` requires `{option}`")]
    MissingOption {
        path: String,
        val_type: &'static str,
        option: &'static str,
    },

    #[error("attribute `{path}`: option `{option}` is invalid: {reason}")]
    InvalidOption {
        path: String,
        option: &'static str,
        reason: String,
    },

    #[error("attribute `{path}`: min ({min}) is greater than max ({max})")]
    InvalidBounds { path: String, min: f64, max: f64 },

    #[error("attribute `{path}`: dimensions must be 1 or 2, got {dimensions}")]
    InvalidDimensions { path: String, dimensions: u64 },

    #[error("attribute `{path}`: unknown editType `{edit_type}`")]
    UnknownEditType { path: String, edit_type: String },

    #[error("`{path}` must be an object")]
    NotAnObject { path: String },

    #[error("`{path}`: marker `{marker}` must be {expected}")]
    InvalidMarker {
        path: String,
        marker: &'static str,
        expected: &'static str,
    },

    #[error("failed to parse schema: {0}")]
    Json(String),
}
