//! Hierarchy-aware asynchronous validation.
//!
//! Validation of a field covers the field, all of its descendants and all of
//! its ancestors. Validators are invoked one after another in update order
//! (the target subtree last-sibling-first, then each ancestor up to the root)
//! without waiting on any of them. Pending results are then joined, and only
//! once every validator has settled is a single update written with all the
//! collected errors.

use std::{collections::HashMap, sync::Arc};

use futures::future::join_all;
use tracing::{debug, trace};

use super::{Form, FormError, update::UpdateRules};
use crate::{
    Result,
    field::{Field, FieldId, visit_down},
    lens::Key,
    validator::Validation,
};

/// Clones every visited node, writing settled errors where a validator ran.
struct WriteErrors {
    settled: HashMap<FieldId, Vec<String>>,
}

impl WriteErrors {
    fn write(&mut self, field: &Field) -> Arc<Field> {
        let mut next = field.clone();
        if let Some(errors) = self.settled.remove(&field.id()) {
            next.set_errors(Arc::from(errors));
        }
        Arc::new(next)
    }
}

impl UpdateRules for WriteErrors {
    fn simple(&mut self, field: &Arc<Field>, _path: &[Key]) -> Result<Arc<Field>> {
        Ok(self.write(field))
    }

    fn object(&mut self, field: &Arc<Field>, _path: &[Key]) -> Result<Arc<Field>> {
        Ok(self.write(field))
    }

    fn array(&mut self, field: &Arc<Field>, _path: &[Key]) -> Result<Arc<Field>> {
        Ok(self.write(field))
    }

    fn rise_object(&mut self, field: &Arc<Field>) -> Result<Arc<Field>> {
        Ok(self.write(field))
    }

    fn rise_array(&mut self, field: &Arc<Field>) -> Result<Arc<Field>> {
        Ok(self.write(field))
    }
}

impl Form {
    /// Fields visited by an update of `target`, in update order.
    fn update_order(&self, target: &Arc<Field>) -> Result<Vec<Arc<Field>>> {
        let mut order = Vec::new();
        visit_down(target, |field| order.push(Arc::clone(field)));

        let mut parent_id = target.parent_id();
        while let Some(id) = parent_id {
            let parent = self.index.get(&id).ok_or(FormError::FieldNotFound { id })?;
            order.push(Arc::clone(parent));
            parent_id = parent.parent_id();
        }
        Ok(order)
    }

    /// Validates `field`, its descendants and its ancestors.
    ///
    /// Each visited field that is validable and has a validator attached gets
    /// its validator invoked with its current value. Invocation order is fixed:
    /// the target subtree depth-first with siblings in reverse declaration
    /// order, then the parent, grandparent and so on up to the root. The order
    /// in which pending validators settle does not matter.
    ///
    /// Non-validable fields are skipped but still rebuilt, and keep their
    /// errors. The returned form is `id + 1` of this one. No cancellation is
    /// provided: if the caller's current form moved on while validating, the
    /// caller decides whether to keep the result (see
    /// [`FormStore`](crate::FormStore)).
    pub async fn validate(&self, field: &Field) -> Result<Form> {
        let target = Arc::clone(self.current(field)?);
        let order = self.update_order(&target)?;

        let mut settled = HashMap::new();
        let mut pending = Vec::new();
        for node in &order {
            if !node.validable() {
                trace!(field_id = %node.id(), "Skipping non-validable field");
                continue;
            }
            let Some(validator) = self.validators.get(&node.id()) else {
                continue;
            };

            trace!(field_id = %node.id(), "Invoking validator");
            let id = node.id();
            match validator.validate(&node.value()) {
                Validation::Ready(errors) => {
                    settled.insert(id, errors);
                }
                Validation::Pending(errors) => pending.push(async move { (id, errors.await) }),
            }
        }
        drop(order);

        debug!(
            form_id = self.id,
            field_id = %target.id(),
            ready = settled.len(),
            pending = pending.len(),
            "Validating field"
        );

        for (id, errors) in join_all(pending).await {
            trace!(field_id = %id, errors = errors.len(), "Validator settled");
            settled.insert(id, errors);
        }

        self.update(&target, &mut WriteErrors { settled })?.checked()
    }
}
