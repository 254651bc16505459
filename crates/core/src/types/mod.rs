pub mod type_descriptor;

use std::fmt::Debug;

pub use type_descriptor::TypeDescriptor;

/// A Rust type that can be the element type of a field.
///
/// Implement through [`impl_field_type!`], which gives every type exactly
/// one process wide [`TypeDescriptor`].
pub trait FieldType: Clone + Default + Debug + Send + Sync + 'static {
    fn type_descriptor() -> &'static TypeDescriptor;
}

#[macro_export]
macro_rules! impl_field_type {
    ($($ty: ty),* $(,)?) => {$(
        impl $crate::types::FieldType for $ty {
            fn type_descriptor() -> &'static $crate::types::TypeDescriptor {
                static DESCRIPTOR: $crate::once_cell::sync::Lazy<
                    $crate::types::TypeDescriptor,
                > = $crate::once_cell::sync::Lazy::new(
                    $crate::types::TypeDescriptor::new::<$ty>,
                );
                &DESCRIPTOR
            }
        }
    )*};
}

impl_field_type!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, String,
);

#[cfg(test)]
mod tests {
    use crate::{index_mask::IndexMask, virtual_array::GBuffer};

    use super::FieldType;

    #[test]
    fn descriptors_are_unique_per_type() {
        assert!(std::ptr::eq(
            i32::type_descriptor(),
            i32::type_descriptor()
        ));
        assert_ne!(i32::type_descriptor(), u32::type_descriptor());
        assert!(f32::type_descriptor().is::<f32>());
    }

    #[test]
    fn layout_matches_rust_type() {
        let ty = f64::type_descriptor();
        assert_eq!(ty.size(), 8);
        assert_eq!(ty.alignment(), std::mem::align_of::<f64>());
        assert_eq!(ty.array_layout(3).size(), 24);
        assert!(ty.is_trivially_destructible());
        assert!(!String::type_descriptor().is_trivially_destructible());
    }

    #[test]
    fn default_value() {
        let ty = String::type_descriptor();
        assert_eq!(ty.default_value().get::<String>(), Some(&String::new()));
        assert_eq!(ty.default_value().get::<i32>(), None);
        assert_eq!(i64::type_descriptor().default_value().get(), Some(&0i64));
    }

    #[test]
    fn lifecycle_over_masked_indices() {
        let ty = String::type_descriptor();
        let mut buffer = GBuffer::allocate(ty, 4);
        let indices = [1, 3];
        let mask = IndexMask::from_indices(&indices);
        let dst = buffer.as_mut_ptr();
        // SAFETY: the buffer holds 4 uninitialized strings, we construct
        // and destruct exactly the masked ones
        unsafe {
            ty.default_construct_indices(dst, mask);
            let first = &*dst.add(ty.size()).cast::<String>();
            assert!(first.is_empty());
            ty.destruct_indices(dst, mask);
        }
    }
}
