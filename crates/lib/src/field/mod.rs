//! Field tree nodes.
//!
//! A form value is held as a tree of [`Field`]s. Every field carries the same
//! header (identity, parent back-reference, UI flags, validation state) and a
//! [`FieldKind`] payload:
//!
//! - [`FieldKind::Simple`] - a scalar leaf (`null`, bool, number, string)
//! - [`FieldKind::Object`] - named children, in the value's own key order
//! - [`FieldKind::Array`] - positional children
//!
//! Nodes are immutable once published and shared as `Arc<Field>`. Updates
//! rebuild only the path from the changed node to the root, so two versions
//! of a form share every untouched subtree by pointer. Parents are referenced
//! by [`FieldId`] and resolved through the form's flat index rather than by
//! pointer, which keeps ownership strictly top-down.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::lens::Key;

pub mod factory;

pub use factory::field_of;

static NEXT_FIELD_ID: AtomicU64 = AtomicU64::new(0);

/// Process-wide unique field identifier.
///
/// Ids are handed out by a monotonic counter and never reused, so an id stays
/// a valid proxy for "the same logical field" across every version of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FieldId(u64);

impl FieldId {
    pub(crate) fn next() -> Self {
        FieldId(NEXT_FIELD_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The variant tag of a field. Fixed for the whole lifetime of an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Simple,
    Object,
    Array,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Simple => write!(f, "simple"),
            FieldType::Object => write!(f, "object"),
            FieldType::Array => write!(f, "array"),
        }
    }
}

/// Variant payload of a [`Field`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Scalar leaf value.
    Simple(Value),
    /// Named children, insertion order preserved.
    Object(IndexMap<String, Arc<Field>>),
    /// Positional children.
    Array(Vec<Arc<Field>>),
}

/// One node of a form tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    id: FieldId,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<FieldId>,
    touched: bool,
    dirty: bool,
    errors: Arc<[String]>,
    validable: bool,
    #[serde(flatten)]
    kind: FieldKind,
}

impl Field {
    pub(crate) fn with_id(id: FieldId, parent_id: Option<FieldId>, kind: FieldKind) -> Self {
        Field {
            id,
            parent_id,
            touched: false,
            dirty: false,
            errors: Arc::from(Vec::new()),
            validable: true,
            kind,
        }
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    /// Id of the containing field; `None` only for a form root.
    pub fn parent_id(&self) -> Option<FieldId> {
        self.parent_id
    }

    pub fn touched(&self) -> bool {
        self.touched
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// This field's own validation errors. Children's errors are not included.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Whether an attached validator is allowed to run for this field.
    pub fn validable(&self) -> bool {
        self.validable
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn field_type(&self) -> FieldType {
        match self.kind {
            FieldKind::Simple(_) => FieldType::Simple,
            FieldKind::Object(_) => FieldType::Object,
            FieldKind::Array(_) => FieldType::Array,
        }
    }

    pub fn is_simple(&self) -> bool {
        matches!(self.kind, FieldKind::Simple(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, FieldKind::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, FieldKind::Array(_))
    }

    /// Iterates direct children in declaration order. Empty for simple fields.
    pub fn children(&self) -> impl Iterator<Item = &Arc<Field>> + '_ {
        let (members, items) = match &self.kind {
            FieldKind::Object(children) => (Some(children.values()), None),
            FieldKind::Array(children) => (None, Some(children.iter())),
            FieldKind::Simple(_) => (None, None),
        };
        members.into_iter().flatten().chain(items.into_iter().flatten())
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        match &self.kind {
            FieldKind::Object(children) => children.len(),
            FieldKind::Array(children) => children.len(),
            FieldKind::Simple(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Object member by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Field>> {
        match &self.kind {
            FieldKind::Object(children) => children.get(name),
            _ => None,
        }
    }

    /// Array element by position.
    pub fn at(&self, index: usize) -> Option<&Arc<Field>> {
        match &self.kind {
            FieldKind::Array(children) => children.get(index),
            _ => None,
        }
    }

    pub fn child(&self, key: &Key) -> Option<&Arc<Field>> {
        match key {
            Key::Name(name) => self.get(name),
            Key::Index(index) => self.at(*index),
        }
    }

    /// Reconstructs the plain value held by this field and its descendants.
    pub fn value(&self) -> Value {
        match &self.kind {
            FieldKind::Simple(value) => value.clone(),
            FieldKind::Object(children) => Value::Object(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.value()))
                    .collect::<Map<String, Value>>(),
            ),
            FieldKind::Array(children) => {
                Value::Array(children.iter().map(|child| child.value()).collect())
            }
        }
    }

    /// A field is valid when it has no own errors and every child is valid.
    ///
    /// `validable` plays no part here: a non-validable field with leftover
    /// errors is still invalid.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.children().all(|child| child.is_valid())
    }

    pub(crate) fn set_touched(&mut self, touched: bool) {
        self.touched = touched;
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub(crate) fn set_validable(&mut self, validable: bool) {
        self.validable = validable;
    }

    pub(crate) fn set_errors(&mut self, errors: Arc<[String]>) {
        self.errors = errors;
    }

    pub(crate) fn clear_errors(&mut self) {
        if !self.errors.is_empty() {
            self.errors = Arc::from(Vec::new());
        }
    }

    pub(crate) fn kind_mut(&mut self) -> &mut FieldKind {
        &mut self.kind
    }

    pub(crate) fn child_at(&self, position: usize) -> Option<&Arc<Field>> {
        match &self.kind {
            FieldKind::Object(children) => children.get_index(position).map(|(_, child)| child),
            FieldKind::Array(children) => children.get(position),
            FieldKind::Simple(_) => None,
        }
    }

    /// Position of the direct child with `id`, searched in declaration order.
    pub(crate) fn position_of(&self, id: FieldId) -> Option<usize> {
        self.children().position(|child| child.id == id)
    }

    /// Replaces the child slot at `position`. Returns `false` if there is none.
    pub(crate) fn replace_child(&mut self, position: usize, child: Arc<Field>) -> bool {
        let slot = match &mut self.kind {
            FieldKind::Object(children) => children.get_index_mut(position).map(|(_, slot)| slot),
            FieldKind::Array(children) => children.get_mut(position),
            FieldKind::Simple(_) => None,
        };
        match slot {
            Some(slot) => {
                *slot = child;
                true
            }
            None => false,
        }
    }
}

/// Visits `field` and all of its descendants.
///
/// Children are pushed on a stack in declaration order and popped last-first,
/// so siblings are visited in reverse declaration order. The tree updater
/// walks in the same order.
pub(crate) fn visit_down(field: &Arc<Field>, mut visit: impl FnMut(&Arc<Field>)) {
    let mut stack = vec![Arc::clone(field)];
    while let Some(current) = stack.pop() {
        stack.extend(current.children().cloned());
        visit(&current);
    }
}
