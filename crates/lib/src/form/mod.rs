//! Versioned form snapshots.
//!
//! A [`Form`] is an immutable snapshot of a form value: the root [`Field`], a
//! flat index from [`FieldId`] to the current node for that id, a version
//! counter, and a side-table of attached validators. Every mutating operation
//! takes `&self` and returns the next snapshot with `id + 1`; the previous
//! snapshot stays valid and shares every untouched subtree with the new one.
//!
//! ```rust
//! use formtree::{Form, lens::FieldPath};
//! use serde_json::json;
//! use std::{str::FromStr, sync::Arc};
//!
//! let form = Form::new(&json!({ "user": { "name": "", "age": 3 } }), None)?;
//! let name = form.resolve(&FieldPath::from_str("user.name")?)?;
//! let age = form.resolve(&FieldPath::from_str("user.age")?)?;
//!
//! let next = form.change(&name, &json!("Ada"))?;
//! assert_eq!(next.id(), form.id() + 1);
//! assert_eq!(next.value(), json!({ "user": { "name": "Ada", "age": 3 } }));
//!
//! // Only the path from `name` to the root was rebuilt.
//! assert!(Arc::ptr_eq(next.field(age.id()).unwrap(), &age));
//! assert!(next.field(name.id()).unwrap().dirty());
//! # Ok::<(), formtree::Error>(())
//! ```

use std::{collections::HashMap, fmt, sync::Arc};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    Result,
    field::{Field, FieldId, field_of, visit_down},
    lens::{FieldPath, resolve_field},
    validator::Validator,
};

mod array;
pub mod errors;
mod ops;
mod structure;
mod update;
mod validate;

pub use errors::FormError;

/// An immutable, versioned snapshot of a form tree.
#[derive(Clone, Serialize)]
pub struct Form {
    id: u64,
    root: Arc<Field>,
    #[serde(skip)]
    index: HashMap<FieldId, Arc<Field>>,
    #[serde(skip)]
    validators: HashMap<FieldId, Validator>,
}

impl Form {
    /// Builds a form from an initial object value.
    ///
    /// Every scalar, object and array inside `initial` becomes a field with a
    /// fresh id. `validator`, if given, is attached to the root field.
    ///
    /// # Errors
    ///
    /// [`FormError::RootNotObject`] if `initial` is not a JSON object.
    pub fn new(initial: &Value, validator: Option<Validator>) -> Result<Self> {
        if !initial.is_object() {
            return Err(FormError::RootNotObject {
                actual: describe(initial).to_string(),
            }
            .into());
        }

        let root = field_of(initial, None);
        let mut index = HashMap::new();
        visit_down(&root, |field| {
            index.insert(field.id(), Arc::clone(field));
        });

        let mut validators = HashMap::new();
        if let Some(validator) = validator {
            validators.insert(root.id(), validator);
        }

        debug!(root_id = %root.id(), fields = index.len(), "Created form");

        Ok(Form {
            id: 0,
            root,
            index,
            validators,
        })
    }

    /// Version counter. Increases by exactly one per mutating operation.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn root(&self) -> &Arc<Field> {
        &self.root
    }

    /// The flat id index of every field reachable from the root.
    pub fn index(&self) -> &HashMap<FieldId, Arc<Field>> {
        &self.index
    }

    /// Current node for `id`, if the field is part of this form.
    pub fn field(&self, id: FieldId) -> Option<&Arc<Field>> {
        self.index.get(&id)
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.index.contains_key(&id)
    }

    /// Resolves a path against the tree of this form.
    pub fn resolve(&self, path: &FieldPath) -> Result<Arc<Field>> {
        Ok(resolve_field(&self.root, path.keys())?)
    }

    /// Plain value of the whole form.
    pub fn value(&self) -> Value {
        self.root.value()
    }

    /// Whether no field in the form carries errors.
    pub fn is_valid(&self) -> bool {
        self.root.is_valid()
    }

    pub fn validator(&self, id: FieldId) -> Option<&Validator> {
        self.validators.get(&id)
    }

    /// Attaches `validator` to the field `id`, replacing any previous one.
    ///
    /// The tree itself is unchanged, so the version counter is not bumped.
    pub fn set_validator(&mut self, id: FieldId, validator: Validator) -> Result<()> {
        if !self.index.contains_key(&id) {
            return Err(FormError::FieldNotFound { id }.into());
        }
        self.validators.insert(id, validator);
        Ok(())
    }

    /// Detaches and returns the validator of field `id`.
    pub fn clear_validator(&mut self, id: FieldId) -> Result<Option<Validator>> {
        if !self.index.contains_key(&id) {
            return Err(FormError::FieldNotFound { id }.into());
        }
        Ok(self.validators.remove(&id))
    }

    /// Serializes a snapshot of the tree. Validators are not included.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Current node for the field `field` refers to.
    ///
    /// Callers may hold a node from an older snapshot; operations always act on
    /// the node this snapshot has for the same id.
    pub(crate) fn current(&self, field: &Field) -> Result<&Arc<Field>> {
        self.index
            .get(&field.id())
            .ok_or_else(|| FormError::FieldNotFound { id: field.id() }.into())
    }

    /// Runs the structure check when built with the `strict` feature.
    pub(crate) fn checked(self) -> Result<Self> {
        #[cfg(feature = "strict")]
        self.assert_structure()?;
        Ok(self)
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut validated: Vec<&FieldId> = self.validators.keys().collect();
        validated.sort();
        f.debug_struct("Form")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("fields", &self.index.len())
            .field("validators", &validated)
            .finish()
    }
}

/// Short name of a value's JSON type, for error messages.
pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
