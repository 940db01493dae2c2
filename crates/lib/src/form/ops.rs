//! Field-level operations: change, touch, validable and error writes.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::{
    Form, FormError, describe,
    update::UpdateRules,
};
use crate::{
    Result,
    field::{Field, FieldKind},
    lens::{FieldPath, Key, resolve},
};

/// Writes a new value over the target subtree and marks the path dirty.
struct Change<'a> {
    value: &'a Value,
}

impl Change<'_> {
    fn value_at(&self, field: &Field, path: &[Key]) -> Result<&Value> {
        let value = resolve(self.value, path)?;
        let mismatch = |expected: String| FormError::ShapeMismatch {
            id: field.id(),
            path: FieldPath::from(path).to_string(),
            expected,
            actual: describe(value).to_string(),
        };

        match (field.kind(), value) {
            (FieldKind::Simple(_), Value::Object(_) | Value::Array(_)) => {
                Err(mismatch("a scalar".to_string()).into())
            }
            (FieldKind::Simple(_), _) => Ok(value),
            (FieldKind::Object(children), Value::Object(members)) => {
                if members.len() == children.len()
                    && children.keys().all(|name| members.contains_key(name))
                {
                    Ok(value)
                } else {
                    let keys: Vec<&str> = children.keys().map(String::as_str).collect();
                    Err(mismatch(format!("an object with keys {keys:?}")).into())
                }
            }
            (FieldKind::Object(_), _) => Err(mismatch("an object".to_string()).into()),
            (FieldKind::Array(children), Value::Array(items)) => {
                if items.len() == children.len() {
                    Ok(value)
                } else {
                    Err(mismatch(format!("an array of length {}", children.len())).into())
                }
            }
            (FieldKind::Array(_), _) => Err(mismatch("an array".to_string()).into()),
        }
    }

    fn dirty(field: &Field) -> Arc<Field> {
        let mut next = field.clone();
        next.set_dirty(true);
        Arc::new(next)
    }
}

impl UpdateRules for Change<'_> {
    fn simple(&mut self, field: &Arc<Field>, path: &[Key]) -> Result<Arc<Field>> {
        let value = self.value_at(field, path)?.clone();
        let mut next = (**field).clone();
        *next.kind_mut() = FieldKind::Simple(value);
        next.set_dirty(true);
        Ok(Arc::new(next))
    }

    fn object(&mut self, field: &Arc<Field>, path: &[Key]) -> Result<Arc<Field>> {
        self.value_at(field, path)?;
        Ok(Self::dirty(field))
    }

    fn array(&mut self, field: &Arc<Field>, path: &[Key]) -> Result<Arc<Field>> {
        self.value_at(field, path)?;
        Ok(Self::dirty(field))
    }

    fn rise_object(&mut self, field: &Arc<Field>) -> Result<Arc<Field>> {
        Ok(Self::dirty(field))
    }

    fn rise_array(&mut self, field: &Arc<Field>) -> Result<Arc<Field>> {
        Ok(Self::dirty(field))
    }
}

/// Marks the target subtree and its ancestors touched.
struct Touch;

impl Touch {
    fn touched(field: &Field) -> Arc<Field> {
        let mut next = field.clone();
        next.set_touched(true);
        Arc::new(next)
    }
}

impl UpdateRules for Touch {
    fn simple(&mut self, field: &Arc<Field>, _path: &[Key]) -> Result<Arc<Field>> {
        Ok(Self::touched(field))
    }

    fn object(&mut self, field: &Arc<Field>, _path: &[Key]) -> Result<Arc<Field>> {
        Ok(Self::touched(field))
    }

    fn array(&mut self, field: &Arc<Field>, _path: &[Key]) -> Result<Arc<Field>> {
        Ok(Self::touched(field))
    }

    fn rise_object(&mut self, field: &Arc<Field>) -> Result<Arc<Field>> {
        Ok(Self::touched(field))
    }

    fn rise_array(&mut self, field: &Arc<Field>) -> Result<Arc<Field>> {
        Ok(Self::touched(field))
    }
}

/// Rewrites the target node only; its descendants are left as they are.
struct AtTarget<F>(F);

impl<F> AtTarget<F>
where
    F: FnMut(&mut Field),
{
    fn apply(&mut self, field: &Arc<Field>, path: &[Key]) -> Arc<Field> {
        if !path.is_empty() {
            return Arc::clone(field);
        }
        let mut next = (**field).clone();
        (self.0)(&mut next);
        Arc::new(next)
    }
}

impl<F> UpdateRules for AtTarget<F>
where
    F: FnMut(&mut Field),
{
    fn simple(&mut self, field: &Arc<Field>, path: &[Key]) -> Result<Arc<Field>> {
        Ok(self.apply(field, path))
    }

    fn object(&mut self, field: &Arc<Field>, path: &[Key]) -> Result<Arc<Field>> {
        Ok(self.apply(field, path))
    }

    fn array(&mut self, field: &Arc<Field>, path: &[Key]) -> Result<Arc<Field>> {
        Ok(self.apply(field, path))
    }
}

impl Form {
    /// Replaces the value held by `field` and its descendants.
    ///
    /// The new value must have the shape of the field: a scalar for a simple
    /// field, an object with exactly the same keys for an object field and an
    /// array of the same length for an array field, recursively. Adding or
    /// removing array elements goes through the array operations. Every
    /// rewritten node and every ancestor is marked dirty.
    ///
    /// # Errors
    ///
    /// [`FormError::ShapeMismatch`] when the value does not fit, or
    /// [`FormError::FieldNotFound`] when `field` is not part of this form.
    pub fn change(&self, field: &Field, value: &Value) -> Result<Form> {
        debug!(form_id = self.id, field_id = %field.id(), "Changing field value");
        self.update(field, &mut Change { value })?.checked()
    }

    /// Marks `field`, its descendants and its ancestors as touched.
    pub fn touch(&self, field: &Field) -> Result<Form> {
        debug!(form_id = self.id, field_id = %field.id(), "Touching field");
        self.update(field, &mut Touch)?.checked()
    }

    /// Sets whether the validator of `field` may run.
    ///
    /// Turning validation off also clears the field's own errors. Turning it on
    /// keeps whatever errors the field already has. Ancestors and descendants
    /// keep their own flag.
    pub fn set_validable(&self, field: &Field, validable: bool) -> Result<Form> {
        debug!(form_id = self.id, field_id = %field.id(), validable, "Setting field validable");
        let mut rules = AtTarget(|next: &mut Field| {
            next.set_validable(validable);
            if !validable {
                next.clear_errors();
            }
        });
        self.update(field, &mut rules)?.checked()
    }

    /// Overwrites the own errors of `field`, e.g. with errors reported by a
    /// server. The validator side-table is not consulted.
    pub fn set_errors(&self, field: &Field, errors: Vec<String>) -> Result<Form> {
        debug!(
            form_id = self.id,
            field_id = %field.id(),
            errors = errors.len(),
            "Setting field errors"
        );
        let errors: Arc<[String]> = Arc::from(errors);
        let mut rules = AtTarget(|next: &mut Field| next.set_errors(Arc::clone(&errors)));
        self.update(field, &mut rules)?.checked()
    }
}
