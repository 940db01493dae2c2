//! Error types for form operations.
//!
//! Every variant here is a logic error: the caller handed the engine a field,
//! value or index that does not fit the current form. Validation failures are
//! never errors; they are stored on [`Field::errors`](crate::Field::errors).

use thiserror::Error;

use crate::field::{FieldId, FieldType};

/// Structured error types for form operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FormError {
    /// The initial value of a form must be an object
    #[error("Form root must be an object, found {actual}")]
    RootNotObject { actual: String },

    /// A field id is not present in the form's index
    #[error("Field {id} not found in form index")]
    FieldNotFound { id: FieldId },

    /// An update tried to turn a field into another variant
    #[error("Tried to change the type of field {id}: expected {expected}, found {actual}")]
    TypeChanged {
        id: FieldId,
        expected: FieldType,
        actual: FieldType,
    },

    /// An update rule returned a node with a different id
    #[error("Update rule replaced field {expected} with field {actual}")]
    IdChanged { expected: FieldId, actual: FieldId },

    /// A child was not found among its recorded parent's children
    #[error("Field {id} is not a child of its recorded parent {parent}")]
    NotInParent { id: FieldId, parent: FieldId },

    /// A simple field was recorded as the parent of another field
    #[error("Simple field {id} found as a parent")]
    SimpleParent { id: FieldId },

    /// A new value does not match the shape of the field it is written to
    #[error("Shape mismatch at '{path}' (field {id}): expected {expected}, found {actual}")]
    ShapeMismatch {
        id: FieldId,
        path: String,
        expected: String,
        actual: String,
    },

    /// An array operation was applied to a non-array field
    #[error("Field {id} is not an array, found {actual}")]
    NotAnArray { id: FieldId, actual: FieldType },

    /// An array index is out of range
    #[error("Index {index} out of bounds for array field {id} of length {len}")]
    IndexOutOfBounds { id: FieldId, index: usize, len: usize },

    /// Removal from an empty array
    #[error("Can't pop from empty array field {id}")]
    EmptyArray { id: FieldId },

    /// The tree and its index disagree
    #[error("Structure violation at field {id}: {reason}")]
    StructureViolation { id: FieldId, reason: String },

    /// The tree updater could not complete
    #[error("Invalid update of field {id}: {reason}")]
    InvalidUpdate { id: FieldId, reason: String },
}

impl FormError {
    /// Check if this error indicates an unknown or stale field
    pub fn is_not_found(&self) -> bool {
        matches!(self, FormError::FieldNotFound { .. })
    }

    /// Check if this error is related to field variants or value shape
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            FormError::RootNotObject { .. }
                | FormError::TypeChanged { .. }
                | FormError::ShapeMismatch { .. }
                | FormError::NotAnArray { .. }
        )
    }

    /// Check if this error is related to array bounds
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            FormError::IndexOutOfBounds { .. } | FormError::EmptyArray { .. }
        )
    }

    /// Check if this error reports an inconsistent tree
    pub fn is_structure_error(&self) -> bool {
        matches!(
            self,
            FormError::StructureViolation { .. }
                | FormError::NotInParent { .. }
                | FormError::SimpleParent { .. }
                | FormError::IdChanged { .. }
                | FormError::InvalidUpdate { .. }
        )
    }

    /// Get the id of the field this error is about, if any
    pub fn field_id(&self) -> Option<FieldId> {
        match self {
            FormError::RootNotObject { .. } => None,
            FormError::FieldNotFound { id }
            | FormError::TypeChanged { id, .. }
            | FormError::NotInParent { id, .. }
            | FormError::SimpleParent { id }
            | FormError::ShapeMismatch { id, .. }
            | FormError::NotAnArray { id, .. }
            | FormError::IndexOutOfBounds { id, .. }
            | FormError::EmptyArray { id }
            | FormError::StructureViolation { id, .. }
            | FormError::InvalidUpdate { id, .. } => Some(*id),
            FormError::IdChanged { expected, .. } => Some(*expected),
        }
    }
}

// Conversion from FormError to the main Error type
impl From<FormError> for crate::Error {
    fn from(err: FormError) -> Self {
        crate::Error::Form(err)
    }
}
