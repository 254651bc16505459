use fieldline_core::{
    errors::{FieldError, FieldInputError},
    field::{
        AnonymousAttributeFieldInputKey, AttributeFieldInputKey, FieldPtr,
        GFieldRef, GVArrayFieldInputValue, VArrayInputField,
    },
    index_mask::IndexMask,
    virtual_array::GVArrayForVArray,
};

use crate::{add, input_i32};

fn attribute_names(field: &FieldPtr<i32>) -> Vec<String> {
    field
        .prepare_inputs()
        .keys()
        .map(|key| {
            key.downcast_ref::<AttributeFieldInputKey>()
                .map(|k| k.name().to_owned())
                .unwrap_or_else(|| format!("{key:?}"))
        })
        .collect()
}

#[test]
fn equal_keys_are_collected_once() {
    // two distinct placeholder nodes with structurally equal keys
    let field = add(input_i32("x", 0), input_i32("x", 5));
    assert_eq!(attribute_names(&field), ["x"]);
}

#[test]
fn keys_are_collected_transitively_in_visit_order() {
    let inner = add(input_i32("b", 0), input_i32("c", 0));
    let field = add(
        input_i32("a", 0),
        add(inner.into_generic(), input_i32("a", 0)).into_generic(),
    );
    assert_eq!(attribute_names(&field), ["a", "b", "c"]);
    let inputs = field.prepare_inputs();
    assert!(inputs.keys().all(|key| !inputs.is_resolved(key)));
}

#[test]
fn key_kinds_never_collide() {
    let named = GFieldRef::from_field(VArrayInputField::new(
        AttributeFieldInputKey::of::<i32>("1"),
    ));
    let anonymous = GFieldRef::from_field(VArrayInputField::new(
        AnonymousAttributeFieldInputKey::of::<i32>(1),
    ));
    let field = add(named, anonymous);
    let inputs = field.prepare_inputs();
    assert_eq!(inputs.len(), 2);
    assert!(inputs.contains(&AnonymousAttributeFieldInputKey::of::<i32>(1)));
    assert!(!inputs.contains(&AnonymousAttributeFieldInputKey::of::<u32>(1)));
}

#[test]
fn binding_an_unknown_key_fails() {
    let field = add(input_i32("x", 0), FieldPtr::constant(0).into_generic());
    let value = GVArrayFieldInputValue::new(GVArrayForVArray::new(vec![1]));
    let mut inputs = field.prepare_inputs();
    let res = inputs.set_input(&AttributeFieldInputKey::of::<i32>("y"), &value);
    assert!(matches!(res, Err(FieldInputError::UnknownKey { .. })));
    let err: FieldError = res.unwrap_err().into();
    assert!(err.to_string().contains("prepare_inputs"));
    assert!(!inputs.is_resolved(&AttributeFieldInputKey::of::<i32>("x")));
}

#[test]
fn anonymous_attribute_binding() -> Result<(), FieldError> {
    let key = AnonymousAttributeFieldInputKey::of::<i32>(42);
    let field = add(
        GFieldRef::from_field(VArrayInputField::new(key)),
        FieldPtr::constant(1).into_generic(),
    );
    let value = GVArrayFieldInputValue::new(GVArrayForVArray::new(vec![4, 5]));
    let mut inputs = field.prepare_inputs();
    inputs.set_input(&key, &value)?;
    let mask = IndexMask::from_len(2);
    assert_eq!(field.evaluate(mask, &inputs).to_vec(mask), [5, 6]);
    Ok(())
}
