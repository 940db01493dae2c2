//! Consistency check between a form's tree and its index.

use std::sync::Arc;

use tracing::error;

use super::{Form, FormError};
use crate::{
    Result,
    field::{Field, FieldId},
};

impl Form {
    /// Walks the whole tree and fails on the first inconsistency.
    ///
    /// Checks that the root is an object without a parent, that the index
    /// entry of every reachable field is that very node, that every child
    /// records its parent's id, that the index holds nothing unreachable, and
    /// that validators are only attached to fields of this form.
    ///
    /// Every operation runs this automatically when the crate is built with
    /// the `strict` feature.
    pub fn assert_structure(&self) -> Result<()> {
        if !self.root.is_object() {
            return Err(violation(self.root.id(), "root is not an object".to_string()));
        }

        let mut stack: Vec<(&Arc<Field>, Option<FieldId>)> = vec![(&self.root, None)];
        let mut reachable = 0;
        while let Some((field, parent)) = stack.pop() {
            reachable += 1;

            match self.index.get(&field.id()) {
                Some(indexed) if Arc::ptr_eq(indexed, field) => {}
                Some(_) => {
                    return Err(violation(
                        field.id(),
                        "index entry is not the node found in the tree".to_string(),
                    ));
                }
                None => {
                    return Err(violation(field.id(), "field is missing from the index".to_string()));
                }
            }

            if field.parent_id() != parent {
                return Err(violation(
                    field.id(),
                    format!(
                        "parent id is {:?} but the field is held by {:?}",
                        field.parent_id(),
                        parent
                    ),
                ));
            }

            stack.extend(field.children().map(|child| (child, Some(field.id()))));
        }

        if reachable != self.index.len() {
            return Err(violation(
                self.root.id(),
                format!(
                    "index holds {} fields but {reachable} are reachable",
                    self.index.len()
                ),
            ));
        }

        if let Some(id) = self.validators.keys().find(|id| !self.index.contains_key(*id)) {
            return Err(violation(*id, "validator attached to an unknown field".to_string()));
        }

        Ok(())
    }
}

fn violation(id: FieldId, reason: String) -> crate::Error {
    error!(field_id = %id, reason = %reason, "Form structure violation");
    FormError::StructureViolation { id, reason }.into()
}
