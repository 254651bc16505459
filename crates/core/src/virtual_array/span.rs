use crate::{index_mask::IndexMask, types::TypeDescriptor};

use super::{GBuffer, GPointer, GSpan, GVArray};

/// View over a borrowed, materialized buffer.
pub struct GVArrayForGSpan<'a> {
    span: GSpan<'a>,
}

impl<'a> GVArrayForGSpan<'a> {
    pub fn new(span: GSpan<'a>) -> Self {
        Self { span }
    }
}

impl GVArray for GVArrayForGSpan<'_> {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        self.span.type_descriptor()
    }
    fn len(&self) -> usize {
        self.span.len()
    }
    fn get(&self, index: usize) -> GPointer<'_> {
        self.span.get(index)
    }
    fn as_span(&self) -> Option<GSpan<'_>> {
        Some(self.span)
    }
}

/// Owns a buffer whose elements are initialized at the indices of `mask`.
///
/// Only masked indices may be read. On drop exactly those elements are
/// destructed before the memory is released.
pub struct GVArrayForOwnedGSpan<'a> {
    buffer: GBuffer,
    mask: IndexMask<'a>,
}

impl<'a> GVArrayForOwnedGSpan<'a> {
    /// # Safety
    /// Every index in `mask` must be initialized in `buffer`, and
    /// `mask.min_array_size()` must not exceed the buffer length.
    pub unsafe fn new(buffer: GBuffer, mask: IndexMask<'a>) -> Self {
        debug_assert!(mask.min_array_size() <= buffer.len());
        Self { buffer, mask }
    }
    pub fn mask(&self) -> IndexMask<'a> {
        self.mask
    }
}

impl GVArray for GVArrayForOwnedGSpan<'_> {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        self.buffer.type_descriptor()
    }
    fn len(&self) -> usize {
        self.buffer.len()
    }
    fn get(&self, index: usize) -> GPointer<'_> {
        assert!(
            self.mask.contains(index),
            "reading an element outside of the evaluated mask"
        );
        let ty = self.buffer.type_descriptor();
        // SAFETY: masked indices are in bounds and initialized
        unsafe {
            GPointer::new(ty, self.buffer.as_ptr().add(index * ty.size()))
        }
    }
    fn initialized_mask(&self) -> IndexMask<'_> {
        self.mask
    }
    fn as_span(&self) -> Option<GSpan<'_>> {
        // a span claims all elements to be initialized
        if !self.mask.covers_prefix(self.buffer.len()) {
            return None;
        }
        // SAFETY: the mask covers the entire buffer
        Some(unsafe {
            GSpan::new(
                self.buffer.type_descriptor(),
                self.buffer.as_ptr(),
                self.buffer.len(),
            )
        })
    }
}

impl Drop for GVArrayForOwnedGSpan<'_> {
    fn drop(&mut self) {
        let ty = self.buffer.type_descriptor();
        // SAFETY: masked elements are initialized and never used again
        unsafe { ty.destruct_indices(self.buffer.as_mut_ptr(), self.mask) }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        index_mask::IndexMask,
        types::FieldType,
        virtual_array::{GBuffer, GSpan, GVArray},
    };

    use super::{GVArrayForGSpan, GVArrayForOwnedGSpan};

    fn owned_strings<'a>(
        mask: IndexMask<'a>,
        len: usize,
    ) -> GVArrayForOwnedGSpan<'a> {
        let ty = String::type_descriptor();
        let mut buffer = GBuffer::allocate(ty, len);
        let value = String::from("v");
        // SAFETY: masked elements of a fresh buffer are uninitialized
        unsafe {
            ty.fill_construct_indices(
                (&value as *const String).cast(),
                buffer.as_mut_ptr(),
                mask,
            );
            GVArrayForOwnedGSpan::new(buffer, mask)
        }
    }

    #[test]
    fn span_view() {
        let data = vec![3u16, 4, 5];
        let varray = GVArrayForGSpan::new(GSpan::from_slice(&data));
        assert_eq!(varray.len(), 3);
        assert_eq!(varray.get(2).get::<u16>(), Some(&5));
        assert!(varray.as_span().is_some());
        assert!(varray.as_single().is_none());
    }

    #[test]
    fn owned_span_with_sparse_mask() {
        let indices = [1, 3];
        let varray = owned_strings(IndexMask::from_indices(&indices), 4);
        let value = varray.get(3).get::<String>().map(String::as_str);
        assert_eq!(value, Some("v"));
        assert!(varray.as_span().is_none());
    }

    #[test]
    #[should_panic(expected = "outside of the evaluated mask")]
    fn owned_span_rejects_unmasked_reads() {
        let indices = [0, 2];
        let varray = owned_strings(IndexMask::from_indices(&indices), 3);
        varray.get(1);
    }

    #[test]
    fn sparse_debug_output_skips_uninitialized() {
        let indices = [0, 2];
        let varray = owned_strings(IndexMask::from_indices(&indices), 3);
        let varray: &dyn GVArray = &varray;
        assert_eq!(format!("{varray:?}"), r#"{0: "v", 2: "v"}"#);
    }

    #[test]
    fn owned_span_with_full_mask_is_a_span() {
        let varray = owned_strings(IndexMask::from_len(2), 2);
        let span = varray.as_span().unwrap();
        assert_eq!(span.typed::<String>().unwrap().len(), 2);
    }
}
