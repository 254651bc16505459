use std::{
    alloc::Layout,
    any::{Any, TypeId},
    fmt::{self, Debug},
    hash::{Hash, Hasher},
};

use crate::{index_mask::IndexMask, virtual_array::GPointer};

/// Runtime description of a field element type.
///
/// Descriptors are created once per type (see [`impl_field_type!`]) and
/// shared by `&'static` reference. Identity is the described type's
/// [`TypeId`].
///
/// All element lifecycle operations go through the descriptor, nothing
/// assumes that elements are trivially constructible or destructible.
pub struct TypeDescriptor {
    name: &'static str,
    type_id: TypeId,
    size: usize,
    alignment: usize,
    trivially_destructible: bool,
    default_value: Box<dyn Any + Send + Sync>,
    copy_construct_fn: unsafe fn(*const u8, *mut u8),
    default_construct_fn: unsafe fn(*mut u8),
    destruct_fn: unsafe fn(*mut u8),
    debug_fmt_fn: unsafe fn(*const u8, &mut fmt::Formatter) -> fmt::Result,
}

unsafe fn copy_construct_impl<T: Clone>(src: *const u8, dst: *mut u8) {
    // SAFETY: caller guarantees `src` points to a valid T and `dst`
    // to uninitialized, properly aligned storage for a T
    unsafe { dst.cast::<T>().write((*src.cast::<T>()).clone()) }
}

unsafe fn default_construct_impl<T: Default>(dst: *mut u8) {
    // SAFETY: caller guarantees `dst` is uninitialized storage for a T
    unsafe { dst.cast::<T>().write(T::default()) }
}

unsafe fn destruct_impl<T>(ptr: *mut u8) {
    // SAFETY: caller guarantees `ptr` points to an initialized T that
    // is not used afterwards
    unsafe { std::ptr::drop_in_place(ptr.cast::<T>()) }
}

unsafe fn debug_fmt_impl<T: Debug>(
    ptr: *const u8,
    f: &mut fmt::Formatter,
) -> fmt::Result {
    // SAFETY: caller guarantees `ptr` points to a valid T
    unsafe { Debug::fmt(&*ptr.cast::<T>(), f) }
}

#[cold]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

impl TypeDescriptor {
    pub fn new<T>() -> Self
    where
        T: Clone + Default + Debug + Send + Sync + 'static,
    {
        Self {
            name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            size: std::mem::size_of::<T>(),
            alignment: std::mem::align_of::<T>(),
            trivially_destructible: !std::mem::needs_drop::<T>(),
            default_value: Box::new(T::default()),
            copy_construct_fn: copy_construct_impl::<T>,
            default_construct_fn: default_construct_impl::<T>,
            destruct_fn: destruct_impl::<T>,
            debug_fmt_fn: debug_fmt_impl::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
    pub fn size(&self) -> usize {
        self.size
    }
    pub fn alignment(&self) -> usize {
        self.alignment
    }
    pub fn is_trivially_destructible(&self) -> bool {
        self.trivially_destructible
    }
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn array_layout(&self, len: usize) -> Layout {
        let Some(size) = self.size.checked_mul(len) else {
            capacity_overflow()
        };
        match Layout::from_size_align(size, self.alignment) {
            Ok(layout) => layout,
            Err(_) => capacity_overflow(),
        }
    }

    pub fn default_value(&'static self) -> GPointer<'static> {
        let ptr = &*self.default_value as *const (dyn Any + Send + Sync);
        // SAFETY: the box holds a `T` matching this descriptor and lives
        // as long as the descriptor does
        unsafe { GPointer::new(self, ptr.cast::<u8>()) }
    }

    /// # Safety
    /// `src` must point to a valid element of this type, `dst` to
    /// uninitialized storage suitably sized and aligned for one.
    pub unsafe fn copy_construct(&self, src: *const u8, dst: *mut u8) {
        unsafe { (self.copy_construct_fn)(src, dst) }
    }

    /// # Safety
    /// `dst` must point to uninitialized storage for one element.
    pub unsafe fn default_construct(&self, dst: *mut u8) {
        unsafe { (self.default_construct_fn)(dst) }
    }

    /// # Safety
    /// `ptr` must point to an initialized element that is not used again.
    pub unsafe fn destruct(&self, ptr: *mut u8) {
        unsafe { (self.destruct_fn)(ptr) }
    }

    /// # Safety
    /// `ptr` must point to a valid element of this type.
    pub unsafe fn debug_fmt(
        &self,
        ptr: *const u8,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        unsafe { (self.debug_fmt_fn)(ptr, f) }
    }

    /// # Safety
    /// `base` must point to an array of this type covering
    /// `mask.min_array_size()` elements. Every masked element
    /// must be initialized and is uninitialized afterwards.
    pub unsafe fn destruct_indices(&self, base: *mut u8, mask: IndexMask) {
        if self.trivially_destructible {
            return;
        }
        for i in mask {
            unsafe { self.destruct(base.add(i * self.size)) }
        }
    }

    /// # Safety
    /// `src` and `dst` must point to non overlapping arrays of this type
    /// covering `mask.min_array_size()` elements. Masked elements must be
    /// initialized in `src` and uninitialized in `dst`.
    pub unsafe fn copy_construct_indices(
        &self,
        src: *const u8,
        dst: *mut u8,
        mask: IndexMask,
    ) {
        for i in mask {
            let offset = i * self.size;
            unsafe { self.copy_construct(src.add(offset), dst.add(offset)) }
        }
    }

    /// # Safety
    /// `value` must point to a valid element of this type, `dst` to an
    /// array covering `mask.min_array_size()` elements whose masked
    /// elements are uninitialized.
    pub unsafe fn fill_construct_indices(
        &self,
        value: *const u8,
        dst: *mut u8,
        mask: IndexMask,
    ) {
        for i in mask {
            unsafe { self.copy_construct(value, dst.add(i * self.size)) }
        }
    }

    /// # Safety
    /// Same requirements on `dst` as for
    /// [`fill_construct_indices`](Self::fill_construct_indices).
    pub unsafe fn default_construct_indices(
        &self,
        dst: *mut u8,
        mask: IndexMask,
    ) {
        for i in mask {
            unsafe { self.default_construct(dst.add(i * self.size)) }
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
