//! Construction of field trees from plain values.

use std::sync::Arc;

use serde_json::Value;

use super::{Field, FieldId, FieldKind};

/// Builds a fresh field tree for `value`.
///
/// Arrays become array fields, objects become object fields and every other
/// value becomes a simple field. Each node gets a newly allocated id and the
/// id of the node that constructed it as its parent. No validator is attached.
pub fn field_of(value: &Value, parent_id: Option<FieldId>) -> Arc<Field> {
    let id = FieldId::next();
    let kind = match value {
        Value::Array(items) => {
            FieldKind::Array(items.iter().map(|item| field_of(item, Some(id))).collect())
        }
        Value::Object(members) => FieldKind::Object(
            members
                .iter()
                .map(|(name, member)| (name.clone(), field_of(member, Some(id))))
                .collect(),
        ),
        scalar => FieldKind::Simple(scalar.clone()),
    };
    Arc::new(Field::with_id(id, parent_id, kind))
}
