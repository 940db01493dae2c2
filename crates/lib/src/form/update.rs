//! The copy-on-path tree updater.
//!
//! Every mutating operation funnels through [`Form::update`]. It runs in two
//! phases:
//!
//! 1. **Dive**: a pre-order walk of the target subtree with an explicit LIFO
//!    stack. Children are pushed in declaration order, so siblings are
//!    visited last-first. Each visited node is passed to the matching
//!    [`UpdateRules`] method together with its path relative to the target.
//! 2. **Rise**: from the target's parent, as recorded in the *old* index, up to
//!    the root. Each ancestor is rebuilt by a rise rule and gets exactly one
//!    child slot replaced by the node produced one level below.
//!
//! A rule may return the very `Arc` it was given; a parent is only rebuilt when
//! one of its children actually changed. Every node the walk produced is
//! written over the old index to make the next snapshot.

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, trace};

use super::{Form, FormError};
use crate::{
    Result,
    field::{Field, FieldId, FieldKind, FieldType},
    lens::Key,
};

/// Per-variant rewrite rules for [`Form::update`].
///
/// Dive rules default to the identity and rise rules to a plain clone.
pub(crate) trait UpdateRules {
    fn simple(&mut self, field: &Arc<Field>, _path: &[Key]) -> Result<Arc<Field>> {
        Ok(Arc::clone(field))
    }

    fn object(&mut self, field: &Arc<Field>, _path: &[Key]) -> Result<Arc<Field>> {
        Ok(Arc::clone(field))
    }

    fn array(&mut self, field: &Arc<Field>, _path: &[Key]) -> Result<Arc<Field>> {
        Ok(Arc::clone(field))
    }

    fn rise_object(&mut self, field: &Arc<Field>) -> Result<Arc<Field>> {
        Ok(Arc::new((**field).clone()))
    }

    fn rise_array(&mut self, field: &Arc<Field>) -> Result<Arc<Field>> {
        Ok(Arc::new((**field).clone()))
    }
}

/// A node waiting on the dive stack.
struct Pending {
    field: Arc<Field>,
    path: Vec<Key>,
    /// Arena slot of the rebuilt parent and the child's position in it.
    parent: Option<(usize, usize)>,
}

/// Checks that a rule kept the variant and the id of the node it was given.
fn check_rewrite(before: &Field, after: &Field) -> Result<()> {
    if before.id() != after.id() {
        return Err(FormError::IdChanged {
            expected: before.id(),
            actual: after.id(),
        }
        .into());
    }
    if before.field_type() != after.field_type() {
        return Err(FormError::TypeChanged {
            id: before.id(),
            expected: before.field_type(),
            actual: after.field_type(),
        }
        .into());
    }
    Ok(())
}

fn keyed_children(field: &Field) -> Vec<(Key, Arc<Field>)> {
    match field.kind() {
        FieldKind::Object(children) => children
            .iter()
            .map(|(name, child)| (Key::from(name), Arc::clone(child)))
            .collect(),
        FieldKind::Array(children) => children
            .iter()
            .enumerate()
            .map(|(index, child)| (Key::Index(index), Arc::clone(child)))
            .collect(),
        FieldKind::Simple(_) => Vec::new(),
    }
}

impl Form {
    /// Rebuilds the path from `target` to the root, applying `rules`.
    ///
    /// The returned snapshot is not structure-checked; callers finish with
    /// [`Form::checked`] once any removed ids have been purged.
    pub(crate) fn update(&self, target: &Field, rules: &mut impl UpdateRules) -> Result<Form> {
        let target = Arc::clone(self.current(target)?);
        let mut staged: HashMap<FieldId, Arc<Field>> = HashMap::new();

        let dove = self.dive(&target, rules, &mut staged)?;
        let root = self.rise(&target, dove, rules, &mut staged)?;

        if root.id() != self.root.id() {
            return Err(FormError::InvalidUpdate {
                id: target.id(),
                reason: format!("rise ended at field {} instead of the root", root.id()),
            }
            .into());
        }

        debug!(
            form_id = self.id + 1,
            target_id = %target.id(),
            rebuilt = staged.len(),
            "Updated form tree"
        );

        let mut index = self.index.clone();
        index.extend(staged);

        Ok(Form {
            id: self.id + 1,
            root,
            index,
            validators: self.validators.clone(),
        })
    }

    fn dive(
        &self,
        target: &Arc<Field>,
        rules: &mut impl UpdateRules,
        staged: &mut HashMap<FieldId, Arc<Field>>,
    ) -> Result<Arc<Field>> {
        let mut stack = vec![Pending {
            field: Arc::clone(target),
            path: Vec::new(),
            parent: None,
        }];
        // Rewritten nodes in visiting order; a parent always precedes its children.
        let mut visited: Vec<(Arc<Field>, Option<(usize, usize)>)> = Vec::new();

        while let Some(Pending {
            field,
            path,
            parent,
        }) = stack.pop()
        {
            let next = match field.field_type() {
                FieldType::Simple => rules.simple(&field, &path)?,
                FieldType::Object => rules.object(&field, &path)?,
                FieldType::Array => rules.array(&field, &path)?,
            };
            check_rewrite(&field, &next)?;
            trace!(field_id = %next.id(), path = ?path, "Dive");

            let slot = visited.len();
            for (position, (key, child)) in keyed_children(&next).into_iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(key);
                stack.push(Pending {
                    field: child,
                    path: child_path,
                    parent: Some((slot, position)),
                });
            }
            visited.push((next, parent));
        }

        // Children sit after their parent in the arena, so popping from the
        // back finishes every child before its parent is linked.
        let mut dove = None;
        while let Some((node, parent)) = visited.pop() {
            staged.insert(node.id(), Arc::clone(&node));
            let Some((slot, position)) = parent else {
                dove = Some(node);
                continue;
            };
            let (parent, _) = &mut visited[slot];
            let unchanged = parent
                .child_at(position)
                .is_some_and(|child| Arc::ptr_eq(child, &node));
            if !unchanged && !Arc::make_mut(parent).replace_child(position, node) {
                return Err(FormError::InvalidUpdate {
                    id: parent.id(),
                    reason: format!("no child slot at position {position}"),
                }
                .into());
            }
        }

        dove.ok_or_else(|| {
            FormError::InvalidUpdate {
                id: target.id(),
                reason: "dive produced no node for the target".to_string(),
            }
            .into()
        })
    }

    fn rise(
        &self,
        target: &Arc<Field>,
        dove: Arc<Field>,
        rules: &mut impl UpdateRules,
        staged: &mut HashMap<FieldId, Arc<Field>>,
    ) -> Result<Arc<Field>> {
        let mut child = dove;
        let mut parent_id = target.parent_id();

        while let Some(id) = parent_id {
            let parent = self
                .index
                .get(&id)
                .ok_or(FormError::FieldNotFound { id })?;
            let position = match parent.field_type() {
                FieldType::Simple => return Err(FormError::SimpleParent { id }.into()),
                FieldType::Object | FieldType::Array => {
                    parent
                        .position_of(child.id())
                        .ok_or(FormError::NotInParent {
                            id: child.id(),
                            parent: id,
                        })?
                }
            };

            let mut next = match parent.field_type() {
                FieldType::Array => rules.rise_array(parent)?,
                _ => rules.rise_object(parent)?,
            };
            check_rewrite(parent, &next)?;
            trace!(field_id = %id, position, "Rise");

            if !Arc::make_mut(&mut next).replace_child(position, child) {
                return Err(FormError::InvalidUpdate {
                    id,
                    reason: format!("rise rule dropped child slot {position}"),
                }
                .into());
            }
            staged.insert(id, Arc::clone(&next));
            parent_id = next.parent_id();
            child = next;
        }

        Ok(child)
    }
}
