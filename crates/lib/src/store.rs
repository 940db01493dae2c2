//! Holder for the current form of a consumer.
//!
//! The engine itself never cancels a validation. A [`FormStore`] keeps track of
//! which snapshot is current so that a validation started from an older
//! snapshot can be recognised and dropped instead of rolling back newer
//! changes.
//!
//! ```rust
//! use formtree::{Form, FormStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # futures::executor::block_on(async {
//! let mut store = FormStore::new(Form::new(&json!({ "name": "" }), None)?);
//! let name = Arc::clone(store.form().root().get("name").unwrap());
//!
//! let origin = store.begin_validation();
//! let validated = store.form().validate(&name).await?;
//!
//! // A change lands while validation is in flight.
//! store.apply(|form| form.change(&name, &json!("Ada")))?;
//!
//! assert!(!store.commit_validation(origin, validated));
//! assert_eq!(store.form().value(), json!({ "name": "Ada" }));
//! # Ok::<(), formtree::Error>(())
//! # }).unwrap();
//! ```

use tracing::{debug, warn};

use crate::{Result, form::Form};

/// The current form plus a count of validations in flight.
#[derive(Debug, Clone)]
pub struct FormStore {
    form: Form,
    validating: usize,
}

impl FormStore {
    pub fn new(form: Form) -> Self {
        FormStore {
            form,
            validating: 0,
        }
    }

    /// The current snapshot.
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Installs `form` as the current snapshot.
    pub fn replace(&mut self, form: Form) {
        debug!(from = self.form.id(), to = form.id(), "Replacing current form");
        self.form = form;
    }

    /// Runs a synchronous operation on the current snapshot and installs the
    /// result. On error the current snapshot is kept.
    pub fn apply(&mut self, operation: impl FnOnce(&Form) -> Result<Form>) -> Result<()> {
        let next = operation(&self.form)?;
        self.replace(next);
        Ok(())
    }

    /// Records the start of a validation and returns the id of the snapshot
    /// it starts from.
    pub fn begin_validation(&mut self) -> u64 {
        self.validating += 1;
        self.form.id()
    }

    /// Finishes a validation started from snapshot `origin`.
    ///
    /// `validated` is installed only if the current snapshot is still
    /// `origin`. Otherwise it is dropped and `false` is returned.
    pub fn commit_validation(&mut self, origin: u64, validated: Form) -> bool {
        self.validating = self.validating.saturating_sub(1);
        if self.form.id() != origin {
            warn!(
                origin,
                current = self.form.id(),
                "Discarding validation result from a stale form"
            );
            return false;
        }
        self.replace(validated);
        true
    }

    /// Whether any validation begun on this store has not been committed.
    pub fn is_validating(&self) -> bool {
        self.validating > 0
    }
}
