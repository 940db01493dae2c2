//! Path types for addressing fields inside a form value.
//!
//! A [`FieldPath`] is an owned sequence of [`Key`]s. Object members are
//! addressed by name and array elements by position, and the textual form
//! mirrors the way the value would be written in code:
//!
//! ```rust
//! use formtree::lens::{FieldPath, Key};
//! use std::str::FromStr;
//!
//! let path = FieldPath::new().push("nested").push(1).push("bar").push(2);
//! assert_eq!(path.to_string(), "nested[1].bar[2]");
//!
//! let parsed = FieldPath::from_str("nested[1].bar[2]")?;
//! assert_eq!(parsed, path);
//! assert_eq!(parsed.last(), Some(&Key::Index(2)));
//! # Ok::<(), formtree::lens::PathError>(())
//! ```
//!
//! The same path resolves against a raw [`Value`] with [`resolve`], or against
//! a field tree with [`resolve_field`]. Both distinguish a segment that does
//! not exist (an error) from a segment that exists but holds `null` (found).

use std::{fmt, str::FromStr, sync::Arc};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::field::{Field, FieldKind};

/// Error type for path parsing and resolution failures.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The textual path could not be parsed.
    #[error("Malformed path '{input}': {reason}")]
    Malformed { input: String, reason: String },

    /// A path segment does not exist in the value or field tree.
    #[error("Can't find path '{path}': {reason}")]
    NotFound { path: String, reason: String },
}

impl PathError {
    /// Check if this error is a resolution failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PathError::NotFound { .. })
    }

    /// Get the offending path or input.
    pub fn path(&self) -> &str {
        match self {
            PathError::Malformed { input, .. } => input,
            PathError::NotFound { path, .. } => path,
        }
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}

/// One segment of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Key {
    /// Member of an object.
    Name(String),
    /// Element of an array.
    Index(usize),
}

impl Key {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Name(_) => None,
            Key::Index(index) => Some(*index),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "{name}"),
            Key::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// An owned path from the form root to a field.
///
/// The empty path addresses the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath {
    keys: Vec<Key>,
}

impl FieldPath {
    /// Creates a new empty path.
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Adds a key to the end of this path.
    pub fn push(mut self, key: impl Into<Key>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Returns a new path extended by `key`, leaving `self` untouched.
    pub fn child(&self, key: impl Into<Key>) -> Self {
        self.clone().push(key)
    }

    /// Joins this path with another path.
    pub fn join(mut self, other: &FieldPath) -> Self {
        self.keys.extend(other.keys.iter().cloned());
        self
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Returns the number of keys in the path.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the path addresses the root.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the parent path, or `None` if this is the root.
    pub fn parent(&self) -> Option<FieldPath> {
        if self.keys.is_empty() {
            None
        } else {
            Some(FieldPath {
                keys: self.keys[..self.keys.len() - 1].to_vec(),
            })
        }
    }

    /// Returns the last key of the path, or `None` if empty.
    pub fn last(&self) -> Option<&Key> {
        self.keys.last()
    }
}

impl From<Vec<Key>> for FieldPath {
    fn from(keys: Vec<Key>) -> Self {
        FieldPath { keys }
    }
}

impl From<&[Key]> for FieldPath {
    fn from(keys: &[Key]) -> Self {
        FieldPath {
            keys: keys.to_vec(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, key) in self.keys.iter().enumerate() {
            match key {
                Key::Name(name) if position > 0 => write!(f, ".{name}")?,
                key => write!(f, "{key}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    /// Parses `a.b[1][2].c`. The empty string is the root path.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| PathError::Malformed {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut keys = Vec::new();
        let mut rest = input;
        let mut expect_name = true;
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let close = after.find(']').ok_or_else(|| malformed("unclosed '['"))?;
                let index = after[..close]
                    .parse::<usize>()
                    .map_err(|_| malformed("array index must be a non-negative integer"))?;
                keys.push(Key::Index(index));
                rest = &after[close + 1..];
                expect_name = false;
                continue;
            }

            if !expect_name {
                rest = rest
                    .strip_prefix('.')
                    .ok_or_else(|| malformed("expected '.' or '[' after a key"))?;
            }
            let end = rest.find(['.', '[', ']']).unwrap_or(rest.len());
            if end == 0 {
                return Err(malformed("empty member name"));
            }
            keys.push(Key::Name(rest[..end].to_string()));
            rest = &rest[end..];
            if rest.starts_with(']') {
                return Err(malformed("unexpected ']'"));
            }
            expect_name = false;
        }

        Ok(FieldPath { keys })
    }
}

fn not_found(path: &[Key], done: usize, reason: &str) -> PathError {
    PathError::NotFound {
        path: FieldPath::from(path).to_string(),
        reason: format!(
            "{reason} (after '{}')",
            FieldPath::from(&path[..done])
        ),
    }
}

/// Resolves `path` inside a raw value.
///
/// A key of the wrong kind for its container, an index past the end of an
/// array, a missing object member, or a descent into a scalar fail with
/// [`PathError::NotFound`]. A member that exists and holds `null` resolves to
/// that `null`.
pub fn resolve<'a>(value: &'a Value, path: &[Key]) -> Result<&'a Value, PathError> {
    let mut current = value;
    for (done, key) in path.iter().enumerate() {
        current = match (current, key) {
            (Value::Array(items), Key::Index(index)) => items
                .get(*index)
                .ok_or_else(|| not_found(path, done, "index exceeds array length"))?,
            (Value::Array(_), Key::Name(_)) => {
                return Err(not_found(path, done, "can't find a name key in an array"));
            }
            (Value::Object(members), Key::Name(name)) => members
                .get(name)
                .ok_or_else(|| not_found(path, done, "object has no such member"))?,
            (Value::Object(_), Key::Index(_)) => {
                return Err(not_found(path, done, "can't find an index key in an object"));
            }
            _ => {
                return Err(not_found(path, done, "can't descend into a scalar value"));
            }
        };
    }
    Ok(current)
}

/// Resolves `path` inside a field tree, with the same failure rules as [`resolve`].
pub fn resolve_field(root: &Arc<Field>, path: &[Key]) -> Result<Arc<Field>, PathError> {
    let mut current = root;
    for (done, key) in path.iter().enumerate() {
        current = match (current.kind(), key) {
            (FieldKind::Array(children), Key::Index(index)) => children
                .get(*index)
                .ok_or_else(|| not_found(path, done, "index exceeds array length"))?,
            (FieldKind::Array(_), Key::Name(_)) => {
                return Err(not_found(path, done, "can't find a name key in an array"));
            }
            (FieldKind::Object(children), Key::Name(name)) => children
                .get(name)
                .ok_or_else(|| not_found(path, done, "object has no such member"))?,
            (FieldKind::Object(_), Key::Index(_)) => {
                return Err(not_found(path, done, "can't find an index key in an object"));
            }
            (FieldKind::Simple(_), _) => {
                return Err(not_found(path, done, "can't descend into a simple field"));
            }
        };
    }
    Ok(Arc::clone(current))
}
