//! Stale validation handling in FormStore.

use formtree::FormStore;
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_validation_commits_on_unchanged_form() {
    let log = CallLog::new();
    let mut form = form_of(json!({ "name": "" }));
    attach(
        &mut form,
        "name",
        log.checker("name", |value| {
            if value.as_str() == Some("") {
                errors(&["required"])
            } else {
                vec![]
            }
        }),
    );
    let mut store = FormStore::new(form);

    let origin = store.begin_validation();
    let name = field_at(store.form(), "name");
    let validated = store.form().validate(&name).await.unwrap();
    assert!(store.is_validating());

    assert!(store.commit_validation(origin, validated));
    assert!(!store.is_validating());
    assert_eq!(store.form().id(), origin + 1);
    assert_eq!(field_at(store.form(), "name").errors(), ["required"]);
}

#[tokio::test]
async fn test_stale_validation_is_discarded() {
    let log = CallLog::new();
    let mut form = form_of(json!({ "name": "" }));
    attach(&mut form, "name", log.delayed("name", 5, &["required"]));
    let mut store = FormStore::new(form);

    let origin = store.begin_validation();
    let snapshot = store.form().clone();
    let name = field_at(&snapshot, "name");
    let validating = snapshot.validate(&name);

    // The user keeps typing while validation is in flight.
    store
        .apply(|form| form.change(&name, &json!("Ada")))
        .unwrap();

    let validated = validating.await.unwrap();
    assert!(!store.commit_validation(origin, validated));
    assert!(!store.is_validating());

    // The newer value is kept and the stale errors never land.
    assert_eq!(store.form().value(), json!({ "name": "Ada" }));
    assert!(field_at(store.form(), "name").errors().is_empty());
    assert_eq!(store.form().id(), origin + 1);
}

#[test]
fn test_replace_installs_form() {
    let mut store = FormStore::new(form_of(json!({ "a": 1 })));
    let next = store.form().touch(&field_at(store.form(), "a")).unwrap();
    store.replace(next);
    assert!(field_at(store.form(), "a").touched());
}
