//! Change, touch, validable and error writes.

use std::sync::Arc;

use formtree::{Error, FormError};
use serde_json::json;

use crate::helpers::*;

fn change_sample() -> formtree::Form {
    form_of(json!({
        "a": [{
            "object": { "foo": "", "bar": "" },
            "array": ["foo", "bar"]
        }]
    }))
}

#[test]
fn test_change_leaf_shares_untouched_fields() {
    let form0 = change_sample();
    let foo0 = field_at(&form0, "a[0].object.foo");

    let form1 = form0.change(&foo0, &json!("foo")).unwrap();
    assert_consistent(&form1);
    assert_eq!(form1.id(), form0.id() + 1);

    let foo1 = field_at(&form1, "a[0].object.foo");
    assert_eq!(foo1.value(), json!("foo"));
    assert_eq!(foo1.id(), foo0.id());
    assert!(foo1.dirty());
    assert!(field_at(&form1, "a[0].object").dirty());
    assert!(field_at(&form1, "a[0]").dirty());
    assert!(form1.root().dirty());

    assert!(Arc::ptr_eq(
        &field_at(&form1, "a[0].object.bar"),
        &field_at(&form0, "a[0].object.bar")
    ));
    assert!(Arc::ptr_eq(
        &field_at(&form1, "a[0].array"),
        &field_at(&form0, "a[0].array")
    ));
    assert!(!field_at(&form1, "a[0].object.bar").dirty());

    // Every node on the path to the root is new.
    for path in ["a[0].object.foo", "a[0].object", "a[0]", "a"] {
        assert!(!Arc::ptr_eq(&field_at(&form1, path), &field_at(&form0, path)), "{path}");
    }
    assert!(!Arc::ptr_eq(form1.root(), form0.root()));
}

#[test]
fn test_change_sequence() {
    let form0 = change_sample();
    let form1 = form0
        .change(&field_at(&form0, "a[0].object.foo"), &json!("foo"))
        .unwrap();

    let form2 = form1
        .change(&field_at(&form1, "a[0].object.bar"), &json!("bar"))
        .unwrap();
    assert_consistent(&form2);
    assert_eq!(form2.id(), form1.id() + 1);
    assert_eq!(field_at(&form2, "a[0].object.bar").value(), json!("bar"));
    assert!(Arc::ptr_eq(
        &field_at(&form2, "a[0].object.foo"),
        &field_at(&form1, "a[0].object.foo")
    ));

    let update = json!({ "foo": "oof", "bar": "rab" });
    let form3 = form2
        .change(&field_at(&form2, "a[0].object"), &update)
        .unwrap();
    assert_consistent(&form3);
    assert_eq!(field_at(&form3, "a[0].object").value(), update);
    assert!(Arc::ptr_eq(
        &field_at(&form3, "a[0].array"),
        &field_at(&form2, "a[0].array")
    ));

    let update = json!(["foobar", "baz"]);
    let form4 = form3
        .change(&field_at(&form3, "a[0].array"), &update)
        .unwrap();
    assert_consistent(&form4);
    assert_eq!(form4.id(), 4);
    assert_eq!(field_at(&form4, "a[0].array").value(), update);
    assert!(field_at(&form4, "a[0].array[1]").dirty());
}

#[test]
fn test_change_rejects_wrong_structure() {
    let form = change_sample();
    for path in ["a[0].object", "a[0].array"] {
        let err = form
            .change(&field_at(&form, path), &json!("wrong structure"))
            .unwrap_err();
        assert!(err.is_type_error(), "{path}: {err}");
        assert_eq!(err.module(), "form");
    }
}

#[test]
fn test_change_with_stale_field_uses_current_node() {
    let form0 = change_sample();
    let foo0 = field_at(&form0, "a[0].object.foo");
    let form1 = form0.touch(&foo0).unwrap();

    // foo0 belongs to form0, but the id is still part of form1.
    let form2 = form1.change(&foo0, &json!("x")).unwrap();
    let foo2 = field_at(&form2, "a[0].object.foo");
    assert!(foo2.touched());
    assert!(foo2.dirty());
}

#[test]
fn test_removed_field_cannot_be_reused() {
    let form0 = change_sample();
    let item = field_at(&form0, "a[0]");
    let foo = field_at(&form0, "a[0].object.foo");
    let (form1, _) = form0.remove(&field_at(&form0, "a"), 0).unwrap();

    for err in [
        form1.change(&foo, &json!("x")).unwrap_err(),
        form1.touch(&item).unwrap_err(),
    ] {
        assert!(matches!(err, Error::Form(FormError::FieldNotFound { .. })), "{err}");
        assert!(err.is_not_found());
    }
}

fn flag_sample() -> formtree::Form {
    form_of(json!({ "object": [{ "foo": "", "bar": "" }] }))
}

#[test]
fn test_touch_propagates_up_not_sideways() {
    let form0 = flag_sample();
    let form1 = form0.touch(&field_at(&form0, "object[0].foo")).unwrap();
    assert_consistent(&form1);
    assert_eq!(form1.id(), form0.id() + 1);

    assert!(field_at(&form1, "object[0].foo").touched());
    assert!(field_at(&form1, "object[0]").touched());
    assert!(field_at(&form1, "object").touched());
    assert!(form1.root().touched());
    assert!(Arc::ptr_eq(
        &field_at(&form1, "object[0].bar"),
        &field_at(&form0, "object[0].bar")
    ));
    assert!(!field_at(&form1, "object[0].bar").touched());

    let form2 = form1.touch(&field_at(&form1, "object[0].bar")).unwrap();
    assert_consistent(&form2);
    assert!(field_at(&form2, "object[0].bar").touched());
    assert!(Arc::ptr_eq(
        &field_at(&form2, "object[0].foo"),
        &field_at(&form1, "object[0].foo")
    ));
}

#[test]
fn test_touch_marks_whole_subtree() {
    let form0 = flag_sample();
    let form1 = form0.touch(&field_at(&form0, "object[0]")).unwrap();
    assert!(field_at(&form1, "object[0].foo").touched());
    assert!(field_at(&form1, "object[0].bar").touched());
}

#[test]
fn test_validable_false_clears_errors() {
    let form0 = flag_sample();
    let form0 = form0
        .set_errors(&field_at(&form0, "object[0].foo"), errors(&["error 1", "error 2"]))
        .unwrap();

    let form1 = form0
        .set_validable(&field_at(&form0, "object[0].foo"), false)
        .unwrap();
    assert_consistent(&form1);
    assert_eq!(form1.id(), form0.id() + 1);

    let foo = field_at(&form1, "object[0].foo");
    assert!(!foo.validable());
    assert!(foo.errors().is_empty());
    assert!(Arc::ptr_eq(
        &field_at(&form1, "object[0].bar"),
        &field_at(&form0, "object[0].bar")
    ));
    assert!(field_at(&form1, "object").validable());
    assert!(field_at(&form1, "object[0]").validable());
}

#[test]
fn test_validable_true_keeps_same_errors() {
    let form0 = flag_sample();
    let form1 = form0
        .set_errors(&field_at(&form0, "object[0].bar"), errors(&["error 1", "error 2"]))
        .unwrap();

    let form2 = form1
        .set_validable(&field_at(&form1, "object[0].bar"), true)
        .unwrap();
    assert_consistent(&form2);
    assert_eq!(form2.id(), form1.id() + 1);

    let before = field_at(&form1, "object[0].bar");
    let after = field_at(&form2, "object[0].bar");
    assert!(std::ptr::eq(before.errors(), after.errors()));
    assert_eq!(after.errors(), ["error 1", "error 2"]);
}

#[test]
fn test_every_operation_bumps_id_once() {
    let form0 = flag_sample();
    let foo = field_at(&form0, "object[0].foo");
    let array = field_at(&form0, "object");

    let form1 = form0.change(&foo, &json!("x")).unwrap();
    let form2 = form1.touch(&foo).unwrap();
    let form3 = form2.set_validable(&foo, false).unwrap();
    let form4 = form3.set_errors(&foo, errors(&["e"])).unwrap();
    let (form5, _) = form4.push(&array, &json!({ "foo": "", "bar": "" })).unwrap();
    let form6 = futures::executor::block_on(form5.validate(&foo)).unwrap();

    let ids: Vec<u64> = [&form0, &form1, &form2, &form3, &form4, &form5, &form6]
        .iter()
        .map(|form| form.id())
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6]);
    for form in [&form1, &form2, &form3, &form4, &form5, &form6] {
        assert_consistent(form);
    }
}

#[test]
fn test_failed_operation_leaves_form_untouched() {
    let form0 = flag_sample();
    let value = form0.value();
    assert!(form0.change(&field_at(&form0, "object"), &json!({})).is_err());
    assert_eq!(form0.id(), 0);
    assert_eq!(form0.value(), value);
    assert_consistent(&form0);
}

#[test]
fn test_snapshot_serialization() {
    let form = form_of(json!({ "a": [1] }));
    let snapshot = form.to_json().unwrap();
    let item = &snapshot["root"]["object"]["a"]["array"][0];
    assert_eq!(item["simple"], json!(1));
    assert_eq!(item["touched"], json!(false));
    assert_eq!(item["errors"], json!([]));
}
