pub mod buffer;
pub mod single;
pub mod span;
pub mod typed;

use std::{
    fmt::{self, Debug},
    marker::PhantomData,
    mem::MaybeUninit,
};

use crate::{
    index_mask::IndexMask,
    types::{FieldType, TypeDescriptor},
    utils::maybe_owned::MaybeOwned,
};

pub use buffer::{GBuffer, GValue};
pub use single::{GVArrayForSingleValue, GVArrayForSingleValueRef};
pub use span::{GVArrayForGSpan, GVArrayForOwnedGSpan};
pub use typed::{GVArrayForVArray, VArray, VArrayForSingle, VArrayView};

/// Pointer to a single type-erased element, valid for `'a`.
#[derive(Clone, Copy)]
pub struct GPointer<'a> {
    ty: &'static TypeDescriptor,
    ptr: *const u8,
    _phantom: PhantomData<&'a ()>,
}

impl<'a> GPointer<'a> {
    /// # Safety
    /// `ptr` must point to a valid element of type `ty` that outlives `'a`.
    pub unsafe fn new(ty: &'static TypeDescriptor, ptr: *const u8) -> Self {
        Self {
            ty,
            ptr,
            _phantom: PhantomData,
        }
    }
    pub fn from_ref<T: FieldType>(value: &'a T) -> Self {
        // SAFETY: the reference guarantees validity for 'a
        unsafe { Self::new(T::type_descriptor(), (value as *const T).cast()) }
    }
    pub fn type_descriptor(&self) -> &'static TypeDescriptor {
        self.ty
    }
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }
    pub fn get<T: 'static>(&self) -> Option<&'a T> {
        if !self.ty.is::<T>() {
            return None;
        }
        // SAFETY: type checked above, validity guaranteed by construction
        Some(unsafe { &*self.ptr.cast::<T>() })
    }
}

impl Debug for GPointer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: `ptr` is a valid element of `ty`
        unsafe { self.ty.debug_fmt(self.ptr, f) }
    }
}

/// Borrowed, fully initialized, type-erased slice.
#[derive(Clone, Copy)]
pub struct GSpan<'a> {
    ty: &'static TypeDescriptor,
    data: *const u8,
    len: usize,
    _phantom: PhantomData<&'a ()>,
}

impl<'a> GSpan<'a> {
    /// # Safety
    /// `data` must point to `len` initialized elements of type `ty`
    /// that stay valid for `'a`.
    pub unsafe fn new(
        ty: &'static TypeDescriptor,
        data: *const u8,
        len: usize,
    ) -> Self {
        Self {
            ty,
            data,
            len,
            _phantom: PhantomData,
        }
    }
    pub fn from_slice<T: FieldType>(slice: &'a [T]) -> Self {
        // SAFETY: the slice guarantees validity for 'a
        unsafe {
            Self::new(T::type_descriptor(), slice.as_ptr().cast(), slice.len())
        }
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
    pub fn data(&self) -> *const u8 {
        self.data
    }
    pub fn get(&self, index: usize) -> GPointer<'a> {
        assert!(index < self.len, "span index out of bounds");
        // SAFETY: bounds checked, elements valid for 'a
        unsafe { GPointer::new(self.ty, self.data.add(index * self.ty.size())) }
    }
    pub fn typed<T: 'static>(&self) -> Option<&'a [T]> {
        if !self.ty.is::<T>() {
            return None;
        }
        // SAFETY: type checked, data is aligned and initialized
        Some(unsafe { std::slice::from_raw_parts(self.data.cast(), self.len) })
    }
}

// SAFETY: all element types are `FieldType`s, which are `Send + Sync`
unsafe impl Send for GPointer<'_> {}
unsafe impl Sync for GPointer<'_> {}
unsafe impl Send for GSpan<'_> {}
unsafe impl Sync for GSpan<'_> {}

/// Mutable type-erased slice whose elements may be uninitialized.
pub struct GMutableSpan<'a> {
    ty: &'static TypeDescriptor,
    data: *mut u8,
    len: usize,
    _phantom: PhantomData<&'a mut ()>,
}

impl<'a> GMutableSpan<'a> {
    /// # Safety
    /// `data` must point to storage for `len` elements of type `ty`,
    /// exclusively borrowed for `'a`.
    pub unsafe fn new(
        ty: &'static TypeDescriptor,
        data: *mut u8,
        len: usize,
    ) -> Self {
        Self {
            ty,
            data,
            len,
            _phantom: PhantomData,
        }
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
    pub fn data(&mut self) -> *mut u8 {
        self.data
    }
    pub fn typed<T: 'static>(self) -> Option<&'a mut [MaybeUninit<T>]> {
        if !self.ty.is::<T>() {
            return None;
        }
        // SAFETY: type checked, storage is aligned and exclusively ours.
        // MaybeUninit makes no claim about initialization.
        Some(unsafe {
            std::slice::from_raw_parts_mut(self.data.cast(), self.len)
        })
    }
    pub fn reborrow(&mut self) -> GMutableSpan<'_> {
        GMutableSpan {
            ty: self.ty,
            data: self.data,
            len: self.len,
            _phantom: PhantomData,
        }
    }
}

/// Read-only, type-erased, index addressable array.
///
/// Implementations may materialize their elements or compute the same
/// element for every index, consumers only see [`get`](Self::get).
pub trait GVArray: Send + Sync {
    fn type_descriptor(&self) -> &'static TypeDescriptor;
    fn len(&self) -> usize;
    /// Returns the element at `index`, valid for as long as `self` is.
    fn get(&self, index: usize) -> GPointer<'_>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Indices that may be passed to [`get`](Self::get).
    fn initialized_mask(&self) -> IndexMask<'_> {
        IndexMask::from_len(self.len())
    }
    /// The backing elements, if they are stored contiguously.
    fn as_span(&self) -> Option<GSpan<'_>> {
        None
    }
    /// The shared element, if every index reads the same value.
    fn as_single(&self) -> Option<GPointer<'_>> {
        None
    }
}

pub type GVArrayRef<'a> = MaybeOwned<'a, dyn GVArray + 'a>;

impl dyn GVArray + '_ {
    /// Copies the masked elements into a new buffer of `self.len()`
    /// elements. Indices outside of `mask` stay uninitialized.
    pub fn materialize<'m>(
        &self,
        mask: IndexMask<'m>,
    ) -> GVArrayForOwnedGSpan<'m> {
        assert!(mask.min_array_size() <= self.len());
        let ty = self.type_descriptor();
        let mut buffer = GBuffer::allocate(ty, self.len());
        let dst = buffer.as_mut_ptr();
        // SAFETY: the buffer covers the mask and is uninitialized
        unsafe {
            if let Some(span) = self.as_span() {
                ty.copy_construct_indices(span.data(), dst, mask);
            } else if let Some(value) = self.as_single() {
                ty.fill_construct_indices(value.as_ptr(), dst, mask);
            } else {
                for i in mask {
                    let src = self.get(i).as_ptr();
                    ty.copy_construct(src, dst.add(i * ty.size()));
                }
            }
        }
        // SAFETY: every masked element was constructed above
        unsafe { GVArrayForOwnedGSpan::new(buffer, mask) }
    }
}

impl Debug for dyn GVArray + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(value) = self.as_single() {
            return write!(f, "[{:?}; {}]", value, self.len());
        }
        let mask = self.initialized_mask();
        if mask.covers_prefix(self.len()) {
            return f
                .debug_list()
                .entries(mask.iter().map(|i| self.get(i)))
                .finish();
        }
        f.debug_map()
            .entries(mask.iter().map(|i| (i, self.get(i))))
            .finish()
    }
}
