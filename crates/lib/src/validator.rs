//! Validator functions supplied by the caller.
//!
//! The engine never computes errors itself. A collaborator attaches a
//! [`Validator`] to a field id and the engine invokes it during
//! [`Form::validate`](crate::Form::validate). Invoking a validator is a plain
//! synchronous call to [`Validate::validate`]; it either answers immediately
//! with [`Validation::Ready`] or hands back a future with
//! [`Validation::Pending`] that the engine joins later. Because the call itself
//! is synchronous, the order validators are invoked in is exactly the order the
//! engine walks the tree, whatever order their futures settle in.
//!
//! ```rust
//! use formtree::validator::{self, Validate, Validation};
//! use serde_json::json;
//!
//! let not_empty = validator::from_fn(|value| match value.as_str() {
//!     Some("") => vec!["required".to_string()],
//!     _ => vec![],
//! });
//!
//! match not_empty.validate(&json!("")) {
//!     Validation::Ready(errors) => assert_eq!(errors, vec!["required"]),
//!     Validation::Pending(_) => unreachable!(),
//! }
//! ```

use std::{fmt, future::Future, sync::Arc};

use futures::future::BoxFuture;
use serde_json::Value;

/// Result of invoking a validator: errors now, or errors later.
///
/// An empty error list means valid.
pub enum Validation {
    Ready(Vec<String>),
    Pending(BoxFuture<'static, Vec<String>>),
}

impl Validation {
    pub fn ready(errors: Vec<String>) -> Self {
        Validation::Ready(errors)
    }

    pub fn pending(errors: impl Future<Output = Vec<String>> + Send + 'static) -> Self {
        Validation::Pending(Box::pin(errors))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Validation::Ready(_))
    }

    /// Waits for the error list.
    pub async fn settle(self) -> Vec<String> {
        match self {
            Validation::Ready(errors) => errors,
            Validation::Pending(errors) => errors.await,
        }
    }
}

impl From<Vec<String>> for Validation {
    fn from(errors: Vec<String>) -> Self {
        Validation::Ready(errors)
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Ready(errors) => f.debug_tuple("Ready").field(errors).finish(),
            Validation::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// A field validator.
pub trait Validate: Send + Sync {
    /// Invokes the validator on the current value of a field.
    fn validate(&self, value: &Value) -> Validation;
}

impl<F> Validate for F
where
    F: Fn(&Value) -> Validation + Send + Sync,
{
    fn validate(&self, value: &Value) -> Validation {
        self(value)
    }
}

/// Shared handle to a validator, as stored in a form's validator table.
pub type Validator = Arc<dyn Validate>;

struct FnValidator<F>(F);

impl<F> Validate for FnValidator<F>
where
    F: Fn(&Value) -> Vec<String> + Send + Sync,
{
    fn validate(&self, value: &Value) -> Validation {
        Validation::Ready((self.0)(value))
    }
}

struct AsyncFnValidator<F>(F);

impl<F, Fut> Validate for AsyncFnValidator<F>
where
    F: Fn(&Value) -> Fut + Send + Sync,
    Fut: Future<Output = Vec<String>> + Send + 'static,
{
    fn validate(&self, value: &Value) -> Validation {
        Validation::pending((self.0)(value))
    }
}

struct AllOf(Vec<Validator>);

impl Validate for AllOf {
    fn validate(&self, value: &Value) -> Validation {
        let validations: Vec<Validation> = self.0.iter().map(|v| v.validate(value)).collect();
        if validations.iter().all(Validation::is_ready) {
            let errors = validations
                .into_iter()
                .flat_map(|validation| match validation {
                    Validation::Ready(errors) => errors,
                    Validation::Pending(_) => Vec::new(),
                })
                .collect();
            return Validation::Ready(errors);
        }
        Validation::pending(async move {
            let mut errors = Vec::new();
            for validation in validations {
                errors.extend(validation.settle().await);
            }
            errors
        })
    }
}

/// Wraps a synchronous check.
pub fn from_fn<F>(check: F) -> Validator
where
    F: Fn(&Value) -> Vec<String> + Send + Sync + 'static,
{
    Arc::new(FnValidator(check))
}

/// Wraps a check that answers through a future.
///
/// The closure runs when the validator is invoked; only the returned future
/// is awaited later, so it must own whatever it needs from the value.
pub fn from_async_fn<F, Fut>(check: F) -> Validator
where
    F: Fn(&Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<String>> + Send + 'static,
{
    Arc::new(AsyncFnValidator(check))
}

/// Combines validators: all are invoked in order and their errors concatenated
/// in that order.
pub fn all(validators: impl IntoIterator<Item = Validator>) -> Validator {
    Arc::new(AllOf(validators.into_iter().collect()))
}
