use crate::types::TypeDescriptor;

use super::{GPointer, GVArray, GValue};

/// Broadcasts a borrowed value over `len` indices without materializing.
pub struct GVArrayForSingleValueRef<'a> {
    value: GPointer<'a>,
    len: usize,
}

impl<'a> GVArrayForSingleValueRef<'a> {
    pub fn new(value: GPointer<'a>, len: usize) -> Self {
        Self { value, len }
    }
}

impl GVArray for GVArrayForSingleValueRef<'_> {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        self.value.type_descriptor()
    }
    fn len(&self) -> usize {
        self.len
    }
    fn get(&self, index: usize) -> GPointer<'_> {
        assert!(index < self.len, "virtual array index out of bounds");
        self.value
    }
    fn as_single(&self) -> Option<GPointer<'_>> {
        Some(self.value)
    }
}

/// Broadcasts an owned value over `len` indices without materializing.
pub struct GVArrayForSingleValue {
    value: GValue,
    len: usize,
}

impl GVArrayForSingleValue {
    pub fn new(value: GValue, len: usize) -> Self {
        Self { value, len }
    }
}

impl GVArray for GVArrayForSingleValue {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        self.value.type_descriptor()
    }
    fn len(&self) -> usize {
        self.len
    }
    fn get(&self, index: usize) -> GPointer<'_> {
        assert!(index < self.len, "virtual array index out of bounds");
        self.value.get()
    }
    fn as_single(&self) -> Option<GPointer<'_>> {
        Some(self.value.get())
    }
}
