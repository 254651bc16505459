use crate::{
    errors::FieldTypeMismatch,
    index_mask::IndexMask,
    types::TypeDescriptor,
    virtual_array::{GVArrayForSingleValueRef, GValue},
};

use super::{
    FieldInputKey, FieldInputs, GField, GFieldOutput, GVArrayFieldInputValue,
};

/// Reads the virtual array bound to `key`.
///
/// While the key is unbound, or bound to something that is not a virtual
/// array, the field evaluates to a placeholder: the explicit default if
/// one was given, otherwise the default value of the key's type.
pub struct VArrayInputField<K> {
    key: K,
    default_value: Option<GValue>,
}

impl<K: FieldInputKey> VArrayInputField<K> {
    pub fn new(key: K) -> Self {
        Self {
            key,
            default_value: None,
        }
    }

    pub fn with_default(
        key: K,
        default_value: GValue,
    ) -> Result<Self, FieldTypeMismatch> {
        let expected = key.type_descriptor();
        if default_value.type_descriptor() != expected {
            return Err(FieldTypeMismatch {
                expected: expected.name(),
                got: default_value.type_descriptor().name(),
            });
        }
        Ok(Self {
            key,
            default_value: Some(default_value),
        })
    }

    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: FieldInputKey> GField for VArrayInputField<K> {
    fn output_type(&self) -> &'static TypeDescriptor {
        self.key.type_descriptor()
    }

    fn foreach_input_key<'a>(
        &'a self,
        visit: &mut dyn FnMut(&'a dyn FieldInputKey),
    ) {
        visit(&self.key);
    }

    fn evaluate_generic<'a>(
        &'a self,
        mask: IndexMask<'a>,
        inputs: &'a FieldInputs<'a>,
    ) -> GFieldOutput<'a> {
        if let Some(input) = inputs.get_as::<GVArrayFieldInputValue>(&self.key)
        {
            let varray = input.varray();
            assert_eq!(
                varray.type_descriptor(),
                self.output_type(),
                "input {:?} bound to an array of the wrong type",
                self.key
            );
            debug_assert!(varray.len() >= mask.min_array_size());
            return GFieldOutput::borrowed(varray);
        }
        log::debug!("input {:?} is unresolved, using placeholder", self.key);
        let placeholder = match &self.default_value {
            Some(value) => value.get(),
            None => self.output_type().default_value(),
        };
        GFieldOutput::owned(GVArrayForSingleValueRef::new(
            placeholder,
            mask.min_array_size(),
        ))
    }
}
