use std::sync::Arc;

use crate::types::{FieldType, TypeDescriptor};

use super::{GPointer, GSpan, GVArray};

/// Read-only, index addressable array of a statically known type.
pub trait VArray: Send + Sync {
    type Item: FieldType;

    fn len(&self) -> usize;
    fn get(&self, index: usize) -> &Self::Item;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn as_slice(&self) -> Option<&[Self::Item]> {
        None
    }
    fn as_single(&self) -> Option<&Self::Item> {
        None
    }
}

impl<T: FieldType> VArray for [T] {
    type Item = T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }
    fn get(&self, index: usize) -> &T {
        &self[index]
    }
    fn as_slice(&self) -> Option<&[T]> {
        Some(self)
    }
}

macro_rules! forward_varray_impl {
    ($($target: ty => [$($generics: tt)*]),* $(,)?) => {$(
        impl<$($generics)*> VArray for $target {
            type Item = V::Item;

            fn len(&self) -> usize {
                (**self).len()
            }
            fn get(&self, index: usize) -> &V::Item {
                (**self).get(index)
            }
            fn as_slice(&self) -> Option<&[V::Item]> {
                (**self).as_slice()
            }
            fn as_single(&self) -> Option<&V::Item> {
                (**self).as_single()
            }
        }
    )*};
}

forward_varray_impl!(
    &V => [V: VArray + ?Sized],
    Box<V> => [V: VArray + ?Sized],
    Arc<V> => [V: VArray + ?Sized],
);

impl<T: FieldType> VArray for Vec<T> {
    type Item = T;

    fn len(&self) -> usize {
        Vec::len(self)
    }
    fn get(&self, index: usize) -> &T {
        &self[index]
    }
    fn as_slice(&self) -> Option<&[T]> {
        Some(self)
    }
}

/// Typed broadcast of one value over `len` indices.
#[derive(Clone, Debug, PartialEq)]
pub struct VArrayForSingle<T> {
    value: T,
    len: usize,
}

impl<T: FieldType> VArrayForSingle<T> {
    pub fn new(value: T, len: usize) -> Self {
        Self { value, len }
    }
}

impl<T: FieldType> VArray for VArrayForSingle<T> {
    type Item = T;

    fn len(&self) -> usize {
        self.len
    }
    fn get(&self, index: usize) -> &T {
        assert!(index < self.len, "virtual array index out of bounds");
        &self.value
    }
    fn as_single(&self) -> Option<&T> {
        Some(&self.value)
    }
}

/// Exposes a typed [`VArray`] through the type-erased interface.
pub struct GVArrayForVArray<V> {
    varray: V,
}

impl<V: VArray> GVArrayForVArray<V> {
    pub fn new(varray: V) -> Self {
        Self { varray }
    }
    pub fn inner(&self) -> &V {
        &self.varray
    }
}

impl<V: VArray> GVArray for GVArrayForVArray<V> {
    fn type_descriptor(&self) -> &'static TypeDescriptor {
        V::Item::type_descriptor()
    }
    fn len(&self) -> usize {
        self.varray.len()
    }
    fn get(&self, index: usize) -> GPointer<'_> {
        GPointer::from_ref(self.varray.get(index))
    }
    fn as_span(&self) -> Option<GSpan<'_>> {
        self.varray.as_slice().map(GSpan::from_slice)
    }
    fn as_single(&self) -> Option<GPointer<'_>> {
        self.varray.as_single().map(GPointer::from_ref)
    }
}

/// Typed read access to a type-erased array.
pub struct VArrayView<'a, T> {
    varray: &'a dyn GVArray,
    span: Option<&'a [T]>,
}

impl<T> Clone for VArrayView<'_, T> {
    fn clone(&self) -> Self {
        Self {
            varray: self.varray,
            span: self.span,
        }
    }
}

impl<'a, T: FieldType> VArrayView<'a, T> {
    /// Returns `None` if the array's element type is not `T`.
    pub fn new(varray: &'a dyn GVArray) -> Option<Self> {
        if !varray.type_descriptor().is::<T>() {
            return None;
        }
        let span = varray.as_span().and_then(|s| s.typed::<T>());
        Some(Self { varray, span })
    }
    pub fn len(&self) -> usize {
        self.varray.len()
    }
    pub fn is_empty(&self) -> bool {
        self.varray.is_empty()
    }
    pub fn get(&self, index: usize) -> &'a T {
        if let Some(span) = self.span {
            return &span[index];
        }
        match self.varray.get(index).get::<T>() {
            Some(v) => v,
            // checked on construction
            None => unreachable!(),
        }
    }
    pub fn as_slice(&self) -> Option<&'a [T]> {
        self.span
    }
    pub fn as_single(&self) -> Option<&'a T> {
        self.varray.as_single().and_then(|v| v.get::<T>())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::virtual_array::GVArray;

    use super::{GVArrayForVArray, VArray, VArrayForSingle, VArrayView};

    #[test]
    fn vec_through_generic_interface() {
        let varray = GVArrayForVArray::new(vec![1i32, 2, 3]);
        let view = VArrayView::<i32>::new(&varray).unwrap();
        assert_eq!(view.as_slice(), Some(&[1, 2, 3][..]));
        assert_eq!(*view.get(1), 2);
        assert!(VArrayView::<u32>::new(&varray).is_none());
    }

    #[test]
    fn single_through_generic_interface() {
        let varray = GVArrayForVArray::new(VArrayForSingle::new(9u8, 4));
        assert!(varray.as_span().is_none());
        let view = VArrayView::<u8>::new(&varray).unwrap();
        assert_eq!(view.as_single(), Some(&9));
        assert_eq!(*view.get(3), 9);
    }

    #[test]
    fn shared_slices() {
        let shared: Arc<[f32]> = Arc::from(vec![0.5f32, 1.5]);
        assert_eq!(VArray::len(&shared), 2);
        let varray = GVArrayForVArray::new(shared.clone());
        assert_eq!(varray.get(1).get::<f32>(), Some(&1.5));
    }
}
