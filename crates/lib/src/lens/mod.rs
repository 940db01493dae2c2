//! Memoized path descriptors.
//!
//! A [`Lens`] names a position inside a form value. It resolves against the
//! tree of a [`Form`] with [`Lens::field`] or against a plain value of the same
//! shape with [`Lens::value`].
//!
//! Child lenses are memoized: calling [`Lens::get`] twice with the same key on
//! the same lens returns the same lens instance, which callers can compare
//! cheaply with [`Lens::ptr_eq`].
//!
//! ```rust
//! use formtree::{Form, Lens};
//! use serde_json::json;
//!
//! let value = json!({ "nested": [{ "foo": "a" }, { "bar": [1, 2, 3] }] });
//! let form = Form::new(&value, None)?;
//!
//! let root = Lens::root();
//! let bar = root.get("nested").get(1).get("bar");
//! assert_eq!(bar.path().to_string(), "nested[1].bar");
//! assert!(bar.ptr_eq(&root.get("nested").get(1).get("bar")));
//!
//! assert_eq!(bar.get(2).value(&value)?, &json!(3));
//! assert_eq!(bar.field(&form)?.value(), json!([1, 2, 3]));
//! # Ok::<(), formtree::Error>(())
//! ```

use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Result, field::Field, form::Form};

pub mod path;

pub use path::{FieldPath, Key, PathError, resolve, resolve_field};

struct LensInner {
    path: FieldPath,
    children: Mutex<HashMap<Key, Lens>>,
}

/// A memoized path from the root of a form value.
#[derive(Clone)]
pub struct Lens {
    inner: Arc<LensInner>,
}

impl Lens {
    fn with_path(path: FieldPath) -> Self {
        Lens {
            inner: Arc::new(LensInner {
                path,
                children: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// A lens on the whole form value.
    pub fn root() -> Self {
        Self::with_path(FieldPath::new())
    }

    /// Child lens for `key`. Repeated calls return the same instance.
    pub fn get(&self, key: impl Into<Key>) -> Lens {
        let mut children = self
            .inner
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        children
            .entry(key.into())
            .or_insert_with_key(|key| Lens::with_path(self.inner.path.child(key.clone())))
            .clone()
    }

    /// Descendant lens for a relative path, built from memoized `get` calls.
    pub fn at(&self, path: &FieldPath) -> Lens {
        path.keys()
            .iter()
            .fold(self.clone(), |lens, key| lens.get(key.clone()))
    }

    /// Descendant lens for a relative path written as `a.b[1]`.
    pub fn parse(&self, path: &str) -> std::result::Result<Lens, PathError> {
        Ok(self.at(&FieldPath::from_str(path)?))
    }

    /// Path from the root. Displays as `nested[1].bar[2]`.
    pub fn path(&self) -> &FieldPath {
        &self.inner.path
    }

    /// Resolves the lens against the tree of `form`.
    pub fn field(&self, form: &Form) -> Result<Arc<Field>> {
        form.resolve(&self.inner.path)
    }

    /// Resolves the lens against a plain value.
    ///
    /// A member holding `null` resolves to that `null`; a member that does not
    /// exist is an error.
    pub fn value<'a>(&self, value: &'a Value) -> Result<&'a Value> {
        Ok(resolve(value, self.inner.path.keys())?)
    }

    /// Resolves the lens against a plain value and deserializes the result.
    pub fn value_as<T: DeserializeOwned>(&self, value: &Value) -> Result<T> {
        Ok(T::deserialize(self.value(value)?)?)
    }

    /// Whether both handles are the same lens instance.
    pub fn ptr_eq(&self, other: &Lens) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Lens {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for Lens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lens")
            .field(&self.inner.path.to_string())
            .finish()
    }
}
