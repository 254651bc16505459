pub mod constant;
pub mod input_field;
pub mod inputs;
pub mod multi_function_field;
pub mod varray_field;

use std::{collections::HashSet, marker::PhantomData, ops::Deref};

use smallvec::{smallvec, SmallVec};

use crate::{
    errors::FieldTypeMismatch,
    index_mask::IndexMask,
    types::{FieldType, TypeDescriptor},
    utils::{maybe_owned::MaybeOwned, user_counter::{Counted, UserCounter}},
    virtual_array::{GVArray, GVArrayRef, VArray, VArrayView},
};

pub use constant::ConstantField;
pub use input_field::VArrayInputField;
pub use inputs::{
    AnonymousAttributeFieldInputKey, AttributeFieldInputKey, FieldInputKey,
    FieldInputValue, FieldInputs, GVArrayFieldInputValue,
};
pub use multi_function_field::MultiFunctionField;
pub use varray_field::VArrayField;

/// A lazily evaluated computation producing one value per index.
///
/// Fields are immutable once built and are shared through [`GFieldRef`],
/// so one field may feed any number of consumers on any thread.
pub trait GField: Send + Sync {
    fn output_type(&self) -> &'static TypeDescriptor;

    /// Reports the input keys this field reads directly.
    fn foreach_input_key<'a>(
        &'a self,
        _visit: &mut dyn FnMut(&'a dyn FieldInputKey),
    ) {
    }

    /// Reports the fields this field consumes directly.
    fn foreach_input_field<'a>(
        &'a self,
        _visit: &mut dyn FnMut(&'a GFieldRef),
    ) {
    }

    /// Produces a virtual array of at least `mask.min_array_size()`
    /// elements. Only the indices in `mask` may be read.
    fn evaluate_generic<'a>(
        &'a self,
        mask: IndexMask<'a>,
        inputs: &'a FieldInputs<'a>,
    ) -> GFieldOutput<'a>;
}

pub type GFieldRef = UserCounter<dyn GField>;

impl UserCounter<dyn GField> {
    pub fn from_field<F: GField + 'static>(field: F) -> Self {
        let counted: Box<Counted<dyn GField>> = Box::new(Counted::new(field));
        Self::from_counted(counted)
    }
}

assert_impl_all!(GFieldRef: Send, Sync);

impl dyn GField + '_ {
    /// Collects every input key reachable from this field, each distinct
    /// key once, in the order they are first encountered. All of them
    /// start out unbound. Shared subfields are only walked once.
    pub fn prepare_inputs(&self) -> FieldInputs<'_> {
        let mut inputs = FieldInputs::default();
        let mut visited = HashSet::new();
        let mut stack: SmallVec<[&dyn GField; 8]> = smallvec![self];
        let mut children: SmallVec<[&dyn GField; 4]> = SmallVec::new();
        while let Some(field) = stack.pop() {
            if !visited.insert(std::ptr::from_ref(field).cast::<()>()) {
                continue;
            }
            field.foreach_input_key(&mut |key| inputs.add_key(key));
            field.foreach_input_field(&mut |child| children.push(&**child));
            stack.extend(children.drain(..).rev());
        }
        log::debug!(
            "collected {} input keys from {} fields",
            inputs.len(),
            visited.len()
        );
        inputs
    }
}

/// Virtual array produced by an evaluation, either owned or borrowed
/// from the field or its inputs.
pub struct GFieldOutput<'a> {
    varray: GVArrayRef<'a>,
}

impl<'a> GFieldOutput<'a> {
    pub fn owned(varray: impl GVArray + 'a) -> Self {
        let varray: Box<dyn GVArray + 'a> = Box::new(varray);
        Self {
            varray: MaybeOwned::from(varray),
        }
    }
    pub fn borrowed(varray: &'a dyn GVArray) -> Self {
        Self {
            varray: MaybeOwned::from(varray),
        }
    }
    pub fn is_owned(&self) -> bool {
        self.varray.is_owned()
    }
    pub fn varray_ref(&self) -> &dyn GVArray {
        &*self.varray
    }
    pub fn into_varray(self) -> GVArrayRef<'a> {
        self.varray
    }
}

impl<'a> Deref for GFieldOutput<'a> {
    type Target = dyn GVArray + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.varray
    }
}

/// Typed view of an evaluation result.
pub struct FieldOutput<'a, T> {
    output: GFieldOutput<'a>,
    _phantom: PhantomData<fn() -> T>,
}

impl<'a, T: FieldType> FieldOutput<'a, T> {
    pub fn new(output: GFieldOutput<'a>) -> Result<Self, FieldTypeMismatch> {
        let ty = output.type_descriptor();
        if !ty.is::<T>() {
            return Err(FieldTypeMismatch {
                expected: T::type_descriptor().name(),
                got: ty.name(),
            });
        }
        Ok(Self {
            output,
            _phantom: PhantomData,
        })
    }

    pub fn view(&self) -> VArrayView<'_, T> {
        match VArrayView::new(self.output.varray_ref()) {
            Some(view) => view,
            None => unreachable!("type checked on construction"),
        }
    }

    pub fn get(&self, index: usize) -> &T {
        self.view().get(index)
    }

    /// Clones the values at the indices of `mask`.
    pub fn to_vec(&self, mask: IndexMask) -> Vec<T> {
        let view = self.view();
        mask.iter().map(|i| view.get(i).clone()).collect()
    }

    pub fn extract(self) -> GFieldOutput<'a> {
        self.output
    }
}

/// Typed handle to a shared field.
pub struct FieldPtr<T> {
    field: GFieldRef,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for FieldPtr<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T: FieldType> FieldPtr<T> {
    pub fn try_from_generic(
        field: GFieldRef,
    ) -> Result<Self, FieldTypeMismatch> {
        let ty = field.output_type();
        if !ty.is::<T>() {
            return Err(FieldTypeMismatch {
                expected: T::type_descriptor().name(),
                got: ty.name(),
            });
        }
        Ok(Self {
            field,
            _phantom: PhantomData,
        })
    }

    pub fn constant(value: T) -> Self {
        Self {
            field: GFieldRef::from_field(ConstantField::new(value)),
            _phantom: PhantomData,
        }
    }

    /// Reads the attribute `name`, or the type's default while unbound.
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            field: GFieldRef::from_field(VArrayInputField::new(
                AttributeFieldInputKey::of::<T>(name),
            )),
            _phantom: PhantomData,
        }
    }

    pub fn from_varray<V: VArray<Item = T> + 'static>(varray: V) -> Self {
        Self {
            field: GFieldRef::from_field(VArrayField::new(varray)),
            _phantom: PhantomData,
        }
    }

    pub fn as_generic(&self) -> &GFieldRef {
        &self.field
    }
    pub fn into_generic(self) -> GFieldRef {
        self.field
    }

    pub fn prepare_inputs(&self) -> FieldInputs<'_> {
        self.field.prepare_inputs()
    }

    pub fn evaluate<'a>(
        &'a self,
        mask: IndexMask<'a>,
        inputs: &'a FieldInputs<'a>,
    ) -> FieldOutput<'a, T> {
        let output = self.field.evaluate_generic(mask, inputs);
        match FieldOutput::new(output) {
            Ok(output) => output,
            Err(e) => panic!("field evaluated to the wrong type: {e}"),
        }
    }
}

impl<T> Deref for FieldPtr<T> {
    type Target = dyn GField;

    fn deref(&self) -> &Self::Target {
        &*self.field
    }
}

impl<T: FieldType> TryFrom<GFieldRef> for FieldPtr<T> {
    type Error = FieldTypeMismatch;

    fn try_from(field: GFieldRef) -> Result<Self, Self::Error> {
        Self::try_from_generic(field)
    }
}

impl<T> From<FieldPtr<T>> for GFieldRef {
    fn from(field: FieldPtr<T>) -> Self {
        field.field
    }
}

#[cfg(test)]
mod tests {
    use crate::{index_mask::IndexMask, utils::user_counter::UserCounter};

    use super::{FieldPtr, GField, GFieldRef};

    #[test]
    fn typed_handle_checks_output_type() {
        let generic: GFieldRef = FieldPtr::constant(1.5f32).into();
        assert!(FieldPtr::<i32>::try_from_generic(generic.clone()).is_err());
        let typed = FieldPtr::<f32>::try_from(generic.clone()).unwrap();
        assert!(UserCounter::ptr_eq(typed.as_generic(), &generic));
        assert_eq!(UserCounter::users(&generic), 2);
    }

    #[test]
    fn constant_field_needs_no_inputs() {
        let field = FieldPtr::constant(String::from("x"));
        let inputs = field.prepare_inputs();
        assert!(inputs.is_empty());
        let out = field.evaluate(IndexMask::from_len(3), &inputs);
        assert_eq!(out.to_vec(IndexMask::from_len(3)), ["x", "x", "x"]);
        assert!(out.extract().as_single().is_some());
    }

    #[test]
    fn attribute_field_reports_its_key() {
        let field = FieldPtr::<u16>::attribute("id");
        let inputs = field.prepare_inputs();
        assert_eq!(inputs.len(), 1);
        let generic: &dyn GField = &*field;
        assert_eq!(generic.output_type().name(), "u16");
    }

    #[test]
    fn varray_field_ignores_mask() {
        let field = FieldPtr::from_varray(vec![5u8, 6, 7]);
        let inputs = field.prepare_inputs();
        let indices = [2];
        let out = field.evaluate(IndexMask::from_indices(&indices), &inputs);
        assert_eq!(out.view().len(), 3);
        assert_eq!(*out.get(2), 7);
    }
}
