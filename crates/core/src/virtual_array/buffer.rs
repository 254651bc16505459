use std::{
    fmt::{self, Debug},
    ptr::NonNull,
};

use crate::types::{FieldType, TypeDescriptor};

use super::{GMutableSpan, GPointer};

/// Aligned storage for `len` elements of a runtime type.
///
/// The buffer never tracks which elements are initialized. Owners are
/// responsible for destructing what they constructed before the buffer
/// is dropped, dropping only releases the memory.
pub struct GBuffer {
    ty: &'static TypeDescriptor,
    data: NonNull<u8>,
    len: usize,
}

// SAFETY: element types are `Send + Sync`, the memory is exclusively owned
unsafe impl Send for GBuffer {}
unsafe impl Sync for GBuffer {}

impl GBuffer {
    pub fn allocate(ty: &'static TypeDescriptor, len: usize) -> Self {
        let layout = ty.array_layout(len);
        let data = if layout.size() == 0 {
            // alignment is non zero, so this is a well aligned dangling ptr
            NonNull::new(ty.alignment() as *mut u8)
                .unwrap_or(NonNull::dangling())
        } else {
            // SAFETY: layout has non zero size
            let ptr = unsafe { std::alloc::alloc(layout) };
            match NonNull::new(ptr) {
                Some(ptr) => ptr,
                None => std::alloc::handle_alloc_error(layout),
            }
        };
        #[cfg(feature = "debug_logging")]
        log::trace!(
            "allocated buffer of {len} x {} ({} bytes)",
            ty.name(),
            layout.size()
        );
        Self { ty, data, len }
    }
    pub fn type_descriptor(&self) -> &'static TypeDescriptor {
        self.ty
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_ptr()
    }
    pub fn as_mut_span(&mut self) -> GMutableSpan<'_> {
        // SAFETY: the storage is ours and sized for `len` elements
        unsafe { GMutableSpan::new(self.ty, self.data.as_ptr(), self.len) }
    }
}

impl Drop for GBuffer {
    fn drop(&mut self) {
        let layout = self.ty.array_layout(self.len);
        if layout.size() == 0 {
            return;
        }
        #[cfg(feature = "debug_logging")]
        log::trace!("freeing buffer of {} x {}", self.len, self.ty.name());
        // SAFETY: allocated in `allocate` with this exact layout
        unsafe { std::alloc::dealloc(self.data.as_ptr(), layout) }
    }
}

/// An owned, type-erased single value.
pub struct GValue {
    buffer: GBuffer,
}

impl GValue {
    pub fn new<T: FieldType>(value: T) -> Self {
        let mut buffer = GBuffer::allocate(T::type_descriptor(), 1);
        // SAFETY: freshly allocated storage for exactly one T
        unsafe { buffer.as_mut_ptr().cast::<T>().write(value) };
        Self { buffer }
    }
    pub fn from_pointer(value: GPointer) -> Self {
        let ty = value.type_descriptor();
        let mut buffer = GBuffer::allocate(ty, 1);
        // SAFETY: `value` is valid for `ty`, the buffer is uninitialized
        unsafe { ty.copy_construct(value.as_ptr(), buffer.as_mut_ptr()) };
        Self { buffer }
    }
    pub fn default_of(ty: &'static TypeDescriptor) -> Self {
        let mut buffer = GBuffer::allocate(ty, 1);
        // SAFETY: the buffer is uninitialized storage for one element
        unsafe { ty.default_construct(buffer.as_mut_ptr()) };
        Self { buffer }
    }
    pub fn type_descriptor(&self) -> &'static TypeDescriptor {
        self.buffer.type_descriptor()
    }
    pub fn get(&self) -> GPointer<'_> {
        // SAFETY: the element is initialized for our entire lifetime
        unsafe { GPointer::new(self.type_descriptor(), self.buffer.as_ptr()) }
    }
}

impl Clone for GValue {
    fn clone(&self) -> Self {
        GValue::from_pointer(self.get())
    }
}

impl Drop for GValue {
    fn drop(&mut self) {
        let ty = self.buffer.type_descriptor();
        // SAFETY: initialized on construction, never used again
        unsafe { ty.destruct(self.buffer.as_mut_ptr()) }
    }
}

impl Debug for GValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.get(), f)
    }
}
