use crate::{
    index_mask::IndexMask,
    types::{FieldType, TypeDescriptor},
    virtual_array::{GPointer, GVArrayForSingleValueRef},
};

use super::{FieldInputs, GField, GFieldOutput};

/// Produces the same value at every index.
#[derive(Debug, Clone)]
pub struct ConstantField<T> {
    value: T,
}

impl<T: FieldType> ConstantField<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T: FieldType> GField for ConstantField<T> {
    fn output_type(&self) -> &'static TypeDescriptor {
        T::type_descriptor()
    }

    fn evaluate_generic<'a>(
        &'a self,
        mask: IndexMask<'a>,
        _inputs: &'a FieldInputs<'a>,
    ) -> GFieldOutput<'a> {
        GFieldOutput::owned(GVArrayForSingleValueRef::new(
            GPointer::from_ref(&self.value),
            mask.min_array_size(),
        ))
    }
}
