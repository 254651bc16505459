use std::thread;

use fieldline_core::{
    field::{AttributeFieldInputKey, FieldPtr, GVArrayFieldInputValue},
    index_mask::IndexMask,
    utils::user_counter::UserCounter,
    virtual_array::GVArrayForVArray,
};

use crate::{add, input_i32};

#[test]
fn parents_keep_shared_children_alive() {
    let child = input_i32("x", 3);
    let parent = add(child.clone(), child.clone());
    assert_eq!(UserCounter::users(&child), 3);
    drop(child);
    let inputs = parent.prepare_inputs();
    assert_eq!(inputs.len(), 1);
    let mask = IndexMask::from_len(1);
    assert_eq!(parent.evaluate(mask, &inputs).to_vec(mask), [6]);
}

#[test]
fn concurrent_evaluation_of_shared_graph() {
    let shared = input_i32("x", 1);
    let field = add(shared.clone(), FieldPtr::constant(10).into_generic());
    let other = add(shared.clone(), shared.clone());
    let values = GVArrayFieldInputValue::new(GVArrayForVArray::new(
        (0..64).collect::<Vec<i32>>(),
    ));
    let key = AttributeFieldInputKey::of::<i32>("x");

    thread::scope(|s| {
        for i in 0..8 {
            let field = if i % 2 == 0 { field.clone() } else { other.clone() };
            let (values, key) = (&values, &key);
            s.spawn(move || {
                let mut inputs = field.prepare_inputs();
                inputs.set_input(key, values).unwrap();
                let mask = IndexMask::from_len(64);
                for _ in 0..50 {
                    let out = field.evaluate(mask, &inputs);
                    let expected = if i % 2 == 0 { 63 + 10 } else { 2 * 63 };
                    assert_eq!(*out.get(63), expected);
                    let handle = field.clone();
                    drop(handle);
                }
            });
        }
    });

    assert_eq!(UserCounter::users(field.as_generic()), 1);
    assert_eq!(UserCounter::users(&shared), 4);
    drop((field, other));
    assert_eq!(UserCounter::users(&shared), 1);
}
