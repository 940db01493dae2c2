//!
//! formtree: persistent, structurally shared form state.
//! This library keeps a nested form value as an immutable tree of fields and
//! provides path-addressed updates and hierarchy-aware asynchronous validation.
//!
//! ## Core Concepts
//!
//! * **Fields (`field::Field`)**: Nodes of the tree. A field is a scalar leaf, an object with named children or an array with positional children, and carries `touched`, `dirty`, `validable` and its own `errors`.
//! * **Forms (`form::Form`)**: Versioned snapshots holding the root field, a flat id index and the attached validators. Every operation returns a new snapshot with the version bumped by one; unchanged subtrees are shared by pointer between snapshots.
//! * **Lenses (`lens::Lens`)**: Memoized path descriptors that resolve against a form's tree or a plain value.
//! * **Validators (`validator::Validate`)**: Caller-supplied checks attached per field. Validation fans out over a field, its descendants and its ancestors in a fixed order and writes all errors in one update.
//! * **Stores (`store::FormStore`)**: Holder for the current snapshot that drops validation results computed from a stale snapshot.
//!
//! Building with the `strict` feature checks the tree against its index after
//! every operation.

pub mod field;
pub mod form;
pub mod lens;
pub mod store;
pub mod validator;

pub use field::{Field, FieldId, FieldKind, FieldType};
pub use form::{Form, FormError};
pub use lens::{FieldPath, Key, Lens, PathError};
pub use store::FormStore;
pub use validator::{Validate, Validation, Validator};

/// Re-export of the value type fields are built from.
pub use serde_json::Value;

/// Result type used throughout the formtree library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the formtree library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured form errors from the form module
    #[error(transparent)]
    Form(form::FormError),

    /// Structured path errors from the lens module
    #[error(transparent)]
    Path(lens::PathError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Form(_) => "form",
            Error::Path(_) => "lens",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a field or path was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Form(form_err) => form_err.is_not_found(),
            Error::Path(path_err) => path_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is about a value or field of the wrong shape.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Form(form_err) => form_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error is an array index or emptiness error.
    pub fn is_bounds_error(&self) -> bool {
        match self {
            Error::Form(form_err) => form_err.is_bounds_error(),
            _ => false,
        }
    }

    /// Check if this error reports an inconsistent form tree.
    pub fn is_structure_error(&self) -> bool {
        match self {
            Error::Form(form_err) => form_err.is_structure_error(),
            _ => false,
        }
    }

    /// Check if this error comes from parsing a textual path.
    pub fn is_malformed_path(&self) -> bool {
        matches!(self, Error::Path(PathError::Malformed { .. }))
    }
}
