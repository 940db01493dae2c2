//! Array splice operations.
//!
//! Each operation builds the new element list of an array field, writes it
//! with an identity update, and returns the next snapshot. Elements that stay
//! in the array keep their node and id. Removed elements are purged from the
//! index together with every descendant and any attached validator.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use super::{Form, FormError, update::UpdateRules};
use crate::{
    Result,
    field::{Field, FieldKind, field_of, visit_down},
    lens::Key,
};

/// Installs `items` as the children of the target array.
struct Splice {
    items: Option<Vec<Arc<Field>>>,
}

impl UpdateRules for Splice {
    fn array(&mut self, field: &Arc<Field>, path: &[Key]) -> Result<Arc<Field>> {
        match (path.is_empty(), self.items.take()) {
            (true, Some(items)) => {
                let mut next = (**field).clone();
                *next.kind_mut() = FieldKind::Array(items);
                Ok(Arc::new(next))
            }
            (_, items) => {
                self.items = items;
                Ok(Arc::clone(field))
            }
        }
    }
}

impl Form {
    /// Current node of `field`, which must be an array, and its elements.
    fn items_of(&self, field: &Field) -> Result<(Arc<Field>, Vec<Arc<Field>>)> {
        let array = self.current(field)?;
        match array.kind() {
            FieldKind::Array(items) => Ok((Arc::clone(array), items.clone())),
            _ => Err(FormError::NotAnArray {
                id: array.id(),
                actual: array.field_type(),
            }
            .into()),
        }
    }

    fn splice(&self, array: &Field, items: Vec<Arc<Field>>, removed: &[Arc<Field>]) -> Result<Form> {
        let mut next = self.update(array, &mut Splice { items: Some(items) })?;
        for field in removed {
            visit_down(field, |gone| {
                trace!(field_id = %gone.id(), "Purging removed field");
                next.index.remove(&gone.id());
                next.validators.remove(&gone.id());
            });
        }
        next.checked()
    }

    /// Appends a new element built from `value`. Returns the new length.
    pub fn push(&self, field: &Field, value: &Value) -> Result<(Form, usize)> {
        let (array, mut items) = self.items_of(field)?;
        items.push(field_of(value, Some(array.id())));
        let len = items.len();
        debug!(form_id = self.id, field_id = %array.id(), len, "Pushing array element");
        Ok((self.splice(&array, items, &[])?, len))
    }

    /// Removes the last element and returns it.
    pub fn pop(&self, field: &Field) -> Result<(Form, Arc<Field>)> {
        let (array, mut items) = self.items_of(field)?;
        let removed = items
            .pop()
            .ok_or(FormError::EmptyArray { id: array.id() })?;
        debug!(form_id = self.id, field_id = %array.id(), removed_id = %removed.id(), "Popping array element");
        let next = self.splice(&array, items, std::slice::from_ref(&removed))?;
        Ok((next, removed))
    }

    /// Inserts a new element built from `value` at `index`, which may equal
    /// the current length. Returns the new length.
    pub fn insert(&self, field: &Field, value: &Value, index: usize) -> Result<(Form, usize)> {
        let (array, mut items) = self.items_of(field)?;
        if index > items.len() {
            return Err(FormError::IndexOutOfBounds {
                id: array.id(),
                index,
                len: items.len(),
            }
            .into());
        }
        items.insert(index, field_of(value, Some(array.id())));
        let len = items.len();
        debug!(form_id = self.id, field_id = %array.id(), index, len, "Inserting array element");
        Ok((self.splice(&array, items, &[])?, len))
    }

    /// Prepends a new element built from `value`. Returns the new length.
    pub fn unshift(&self, field: &Field, value: &Value) -> Result<(Form, usize)> {
        self.insert(field, value, 0)
    }

    /// Removes the element at `index` and returns it.
    pub fn remove(&self, field: &Field, index: usize) -> Result<(Form, Arc<Field>)> {
        let (array, mut items) = self.items_of(field)?;
        check_bounds(&array, index, items.len())?;
        let removed = items.remove(index);
        debug!(form_id = self.id, field_id = %array.id(), index, removed_id = %removed.id(), "Removing array element");
        let next = self.splice(&array, items, std::slice::from_ref(&removed))?;
        Ok((next, removed))
    }

    /// Exchanges the elements at `a` and `b`.
    pub fn swap(&self, field: &Field, a: usize, b: usize) -> Result<Form> {
        let (array, mut items) = self.items_of(field)?;
        check_bounds(&array, a, items.len())?;
        check_bounds(&array, b, items.len())?;
        items.swap(a, b);
        debug!(form_id = self.id, field_id = %array.id(), a, b, "Swapping array elements");
        self.splice(&array, items, &[])
    }

    /// Moves the element at `from` to `to`.
    ///
    /// The element is removed first, so `to` is a position in the shortened
    /// array.
    pub fn move_item(&self, field: &Field, from: usize, to: usize) -> Result<Form> {
        let (array, mut items) = self.items_of(field)?;
        check_bounds(&array, from, items.len())?;
        let moved = items.remove(from);
        if to > items.len() {
            return Err(FormError::IndexOutOfBounds {
                id: array.id(),
                index: to,
                len: items.len(),
            }
            .into());
        }
        items.insert(to, moved);
        debug!(form_id = self.id, field_id = %array.id(), from, to, "Moving array element");
        self.splice(&array, items, &[])
    }
}

fn check_bounds(array: &Field, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(FormError::IndexOutOfBounds {
            id: array.id(),
            index,
            len,
        }
        .into())
    }
}
