use crate::{
    index_mask::IndexMask,
    types::{FieldType, TypeDescriptor},
    virtual_array::{GVArrayForVArray, VArray},
};

use super::{FieldInputs, GField, GFieldOutput};

/// Exposes a fixed virtual array as a field, regardless of mask and inputs.
pub struct VArrayField<V> {
    varray: V,
}

impl<V: VArray> VArrayField<V> {
    pub fn new(varray: V) -> Self {
        Self { varray }
    }
    pub fn varray(&self) -> &V {
        &self.varray
    }
}

impl<V: VArray> GField for VArrayField<V> {
    fn output_type(&self) -> &'static TypeDescriptor {
        V::Item::type_descriptor()
    }

    fn evaluate_generic<'a>(
        &'a self,
        mask: IndexMask<'a>,
        _inputs: &'a FieldInputs<'a>,
    ) -> GFieldOutput<'a> {
        debug_assert!(self.varray.len() >= mask.min_array_size());
        GFieldOutput::owned(GVArrayForVArray::new(&self.varray))
    }
}
