use std::{borrow::Cow, marker::PhantomData};

use crate::{index_mask::IndexMask, types::FieldType};

use super::{MultiFunction, Params, Signature};

/// Outputs the same value for every index.
pub struct CustomMfConstant<T> {
    value: T,
    signature: Signature,
}

impl<T: FieldType> CustomMfConstant<T> {
    pub fn new(value: T) -> Self {
        let signature = Signature::build(format!("Constant {value:?}"))
            .single_output::<T>("Value")
            .finish();
        Self { value, signature }
    }
}

unsafe impl<T: FieldType> MultiFunction for CustomMfConstant<T> {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(&self, mask: IndexMask, params: &mut Params) {
        let output = params.uninitialized_single_output_as::<T>(0, "Value");
        for i in mask {
            output[i].write(self.value.clone());
        }
    }
}

/// Elementwise function with one input and one output.
pub struct CustomMfSiSo<In, Out, F> {
    function: F,
    signature: Signature,
    _phantom: PhantomData<fn(&In) -> Out>,
}

impl<In, Out, F> CustomMfSiSo<In, Out, F>
where
    In: FieldType,
    Out: FieldType,
    F: Fn(&In) -> Out + Send + Sync,
{
    pub fn new(name: impl Into<Cow<'static, str>>, function: F) -> Self {
        let signature = Signature::build(name)
            .single_input::<In>("In1")
            .single_output::<Out>("Out")
            .finish();
        Self {
            function,
            signature,
            _phantom: PhantomData,
        }
    }
}

unsafe impl<In, Out, F> MultiFunction for CustomMfSiSo<In, Out, F>
where
    In: FieldType,
    Out: FieldType,
    F: Fn(&In) -> Out + Send + Sync,
{
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(&self, mask: IndexMask, params: &mut Params) {
        let input = params.readonly_single_input_as::<In>(0, "In1");
        let output = params.uninitialized_single_output_as::<Out>(1, "Out");
        if let Some(value) = input.as_single() {
            let result = (self.function)(value);
            for i in mask {
                output[i].write(result.clone());
            }
            return;
        }
        for i in mask {
            output[i].write((self.function)(input.get(i)));
        }
    }
}

/// Elementwise function with two inputs and one output.
pub struct CustomMfSiSiSo<In1, In2, Out, F> {
    function: F,
    signature: Signature,
    _phantom: PhantomData<fn(&In1, &In2) -> Out>,
}

impl<In1, In2, Out, F> CustomMfSiSiSo<In1, In2, Out, F>
where
    In1: FieldType,
    In2: FieldType,
    Out: FieldType,
    F: Fn(&In1, &In2) -> Out + Send + Sync,
{
    pub fn new(name: impl Into<Cow<'static, str>>, function: F) -> Self {
        let signature = Signature::build(name)
            .single_input::<In1>("In1")
            .single_input::<In2>("In2")
            .single_output::<Out>("Out")
            .finish();
        Self {
            function,
            signature,
            _phantom: PhantomData,
        }
    }
}

unsafe impl<In1, In2, Out, F> MultiFunction for CustomMfSiSiSo<In1, In2, Out, F>
where
    In1: FieldType,
    In2: FieldType,
    Out: FieldType,
    F: Fn(&In1, &In2) -> Out + Send + Sync,
{
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(&self, mask: IndexMask, params: &mut Params) {
        let lhs = params.readonly_single_input_as::<In1>(0, "In1");
        let rhs = params.readonly_single_input_as::<In2>(1, "In2");
        let output = params.uninitialized_single_output_as::<Out>(2, "Out");
        for i in mask {
            output[i].write((self.function)(lhs.get(i), rhs.get(i)));
        }
    }
}
