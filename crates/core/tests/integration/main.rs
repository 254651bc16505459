mod evaluation;
mod inputs;
mod sharing;

use std::sync::Arc;

use fieldline_core::{
    field::{
        AttributeFieldInputKey, FieldPtr, GFieldRef, MultiFunctionField,
        VArrayInputField,
    },
    multi_function::{CustomMfSiSiSo, MultiFunction},
    virtual_array::GValue,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn add_i32() -> Arc<dyn MultiFunction> {
    Arc::new(CustomMfSiSiSo::new("add", |a: &i32, b: &i32| a + b))
}

pub fn add(lhs: GFieldRef, rhs: GFieldRef) -> FieldPtr<i32> {
    let field = MultiFunctionField::new([lhs, rhs], add_i32(), 2);
    match FieldPtr::try_from_generic(GFieldRef::from_field(field)) {
        Ok(field) => field,
        Err(e) => panic!("{e}"),
    }
}

pub fn input_i32(name: &str, default: i32) -> GFieldRef {
    let key = AttributeFieldInputKey::of::<i32>(name);
    GFieldRef::from_field(
        VArrayInputField::with_default(key, GValue::new(default)).unwrap(),
    )
}
