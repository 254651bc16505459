use std::{fmt::Debug, ops::Deref};

/// Either borrows a `T` or owns it in a box.
///
/// Evaluation results are usually freshly allocated, but may also be views
/// into storage owned by a field or an input table.
pub enum MaybeOwned<'a, T: ?Sized> {
    Borrowed(&'a T),
    Owned(Box<T>),
}

impl<T: ?Sized> MaybeOwned<'_, T> {
    pub fn is_owned(&self) -> bool {
        matches!(self, MaybeOwned::Owned(_))
    }
}

impl<T: ?Sized> Deref for MaybeOwned<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            MaybeOwned::Borrowed(v) => v,
            MaybeOwned::Owned(v) => v,
        }
    }
}

impl<'a, T: ?Sized> From<&'a T> for MaybeOwned<'a, T> {
    fn from(value: &'a T) -> Self {
        MaybeOwned::Borrowed(value)
    }
}

impl<T: ?Sized> From<Box<T>> for MaybeOwned<'_, T> {
    fn from(value: Box<T>) -> Self {
        MaybeOwned::Owned(value)
    }
}

impl<T: ?Sized + Debug> Debug for MaybeOwned<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&**self, f)
    }
}
