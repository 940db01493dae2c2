use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use formtree::{Field, FieldPath, Form, Validator, validator};
use serde_json::Value;

// ==========================
// FORM FACTORIES
// ==========================

/// Creates a form from a JSON value, panicking on a non-object root.
pub fn form_of(value: Value) -> Form {
    Form::new(&value, None).expect("Failed to create form")
}

/// Current field at `path` (written as `a.b[1]`) in `form`.
pub fn field_at(form: &Form, path: &str) -> Arc<Field> {
    let path = FieldPath::from_str(path).expect("Malformed test path");
    form.resolve(&path)
        .unwrap_or_else(|e| panic!("Field '{path}' not found: {e}"))
}

/// Attaches `validator` to the field at `path`.
pub fn attach(form: &mut Form, path: &str, validator: Validator) {
    let id = field_at(form, path).id();
    form.set_validator(id, validator)
        .expect("Failed to attach validator");
}

/// Asserts that tree and index agree.
pub fn assert_consistent(form: &Form) {
    if let Err(e) = form.assert_structure() {
        panic!("Form {} is inconsistent: {e}", form.id());
    }
}

// ==========================
// VALIDATOR RECORDING
// ==========================

/// Shared log of validator invocations and settlements.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
    settled: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the validators invoked so far, in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Names of the async validators settled so far, in settlement order.
    pub fn settled(&self) -> Vec<String> {
        self.settled.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
        self.settled.lock().unwrap().clear();
    }

    /// A synchronous validator that records `name` and returns no errors.
    pub fn recorder(&self, name: &str) -> Validator {
        self.checker(name, |_| Vec::new())
    }

    /// A synchronous validator that records `name` and runs `check`.
    pub fn checker(
        &self,
        name: &str,
        check: impl Fn(&Value) -> Vec<String> + Send + Sync + 'static,
    ) -> Validator {
        let calls = Arc::clone(&self.calls);
        let name = name.to_string();
        validator::from_fn(move |value| {
            calls.lock().unwrap().push(name.clone());
            check(value)
        })
    }

    /// An async validator that records `name` when invoked, sleeps for
    /// `delay_ms`, records `name` again when it settles, and returns `errors`.
    pub fn delayed(&self, name: &str, delay_ms: u64, errors: &[&str]) -> Validator {
        let calls = Arc::clone(&self.calls);
        let settled = Arc::clone(&self.settled);
        let name = name.to_string();
        let errors: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        validator::from_async_fn(move |_| {
            calls.lock().unwrap().push(name.clone());
            let settled = Arc::clone(&settled);
            let name = name.clone();
            let errors = errors.clone();
            async move {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                settled.lock().unwrap().push(name);
                errors
            }
        })
    }
}

/// Converts string literals into an owned error list.
pub fn errors(list: &[&str]) -> Vec<String> {
    list.iter().map(|e| e.to_string()).collect()
}
