use std::sync::Arc;

use fieldline_core::{
    errors::FieldError,
    field::{
        AttributeFieldInputKey, FieldPtr, GFieldRef, GVArrayFieldInputValue,
        MultiFunctionField,
    },
    index_mask::IndexMask,
    multi_function::CustomMfSiSo,
    virtual_array::GVArrayForVArray,
};
use rstest::rstest;

use crate::{add, init_logging, input_i32};

#[test]
fn add_constant_to_input() -> Result<(), FieldError> {
    init_logging();
    let field = add(
        FieldPtr::constant(2).into_generic(),
        input_i32("X", 10),
    );
    let value =
        GVArrayFieldInputValue::new(GVArrayForVArray::new(vec![1, 2, 3]));
    let mut inputs = field.prepare_inputs();
    let mask = IndexMask::from_len(3);

    assert_eq!(field.evaluate(mask, &inputs).to_vec(mask), [12, 12, 12]);

    inputs.set_input(&AttributeFieldInputKey::of::<i32>("X"), &value)?;
    assert_eq!(field.evaluate(mask, &inputs).to_vec(mask), [3, 4, 5]);
    Ok(())
}

#[rstest]
#[case(&[0, 1, 2, 3, 4, 5])]
#[case(&[1, 3, 4])]
#[case(&[5])]
#[case(&[])]
fn elementwise_function_matches_per_index(#[case] indices: &[usize]) {
    let data = vec![-3i64, 0, 7, 12, -1, 40];
    let square = CustomMfSiSo::new("square", |v: &i64| v * v);
    let field = FieldPtr::<i64>::try_from_generic(GFieldRef::from_field(
        MultiFunctionField::new(
            [FieldPtr::from_varray(data.clone()).into_generic()],
            Arc::new(square),
            1,
        ),
    ))
    .unwrap();
    let inputs = field.prepare_inputs();
    let mask = IndexMask::from_indices(indices);
    let out = field.evaluate(mask, &inputs);
    for i in mask {
        assert_eq!(*out.get(i), data[i] * data[i]);
    }
    assert_eq!(out.view().len(), mask.min_array_size());
}

#[test]
fn evaluation_is_repeatable() {
    let field = add(input_i32("a", 1), input_i32("b", 2));
    let inputs = field.prepare_inputs();
    let mask = IndexMask::from_range(2..6);
    let first = field.evaluate(mask, &inputs).to_vec(mask);
    let second = field.evaluate(mask, &inputs).to_vec(mask);
    assert_eq!(first, [3, 3, 3, 3]);
    assert_eq!(first, second);
}

#[test]
fn nested_combinators() -> Result<(), FieldError> {
    init_logging();
    // (a + 1) + (a + b)
    let a = input_i32("a", 0);
    let lhs = add(a.clone(), FieldPtr::constant(1).into_generic());
    let rhs = add(a, input_i32("b", 100));
    let field = add(lhs.into_generic(), rhs.into_generic());

    let a_values =
        GVArrayFieldInputValue::new(GVArrayForVArray::new(vec![1, 2]));
    let b_values =
        GVArrayFieldInputValue::new(GVArrayForVArray::new(vec![10, 20]));
    let mut inputs = field.prepare_inputs();
    assert_eq!(inputs.len(), 2);
    let mask = IndexMask::from_len(2);
    assert_eq!(field.evaluate(mask, &inputs).to_vec(mask), [101, 101]);

    inputs.set_input(&AttributeFieldInputKey::of::<i32>("a"), &a_values)?;
    inputs.set_input(&AttributeFieldInputKey::of::<i32>("b"), &b_values)?;
    assert_eq!(field.evaluate(mask, &inputs).to_vec(mask), [13, 25]);
    Ok(())
}

#[test]
fn strings_flow_through_combinators() {
    let greet = CustomMfSiSo::new("greet", |name: &String| {
        format!("hello {name}")
    });
    let field = FieldPtr::<String>::try_from_generic(GFieldRef::from_field(
        MultiFunctionField::new(
            [FieldPtr::<String>::attribute("name").into_generic()],
            Arc::new(greet),
            1,
        ),
    ))
    .unwrap();
    let names = GVArrayFieldInputValue::new(GVArrayForVArray::new(vec![
        String::from("a"),
        String::from("b"),
    ]));
    let mut inputs = field.prepare_inputs();
    let mask = IndexMask::from_len(2);
    let unbound = field.evaluate(mask, &inputs).to_vec(mask);
    assert_eq!(unbound, ["hello ", "hello "]);
    inputs
        .set_input(&AttributeFieldInputKey::of::<String>("name"), &names)
        .unwrap();
    assert_eq!(
        field.evaluate(mask, &inputs).to_vec(mask),
        ["hello a", "hello b"]
    );
}
