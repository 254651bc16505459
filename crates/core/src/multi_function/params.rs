use std::mem::MaybeUninit;

use smallvec::SmallVec;

use crate::{
    types::FieldType,
    virtual_array::{GMutableSpan, GVArray, VArrayView},
};

use super::signature::{ParamCategory, ParamDef, Signature};

/// Bound arguments of a single multi-function call.
///
/// Parameters are addressed by their index in the signature. The name
/// passed alongside is only checked in debug builds.
pub struct Params<'a> {
    signature: &'a Signature,
    min_array_size: usize,
    single_inputs: SmallVec<[&'a dyn GVArray; 4]>,
    single_outputs: SmallVec<[Option<GMutableSpan<'a>>; 4]>,
}

pub struct ParamsBuilder<'a> {
    params: Params<'a>,
}

impl<'a> ParamsBuilder<'a> {
    pub fn new(signature: &'a Signature, min_array_size: usize) -> Self {
        Self {
            params: Params {
                signature,
                min_array_size,
                single_inputs: SmallVec::new(),
                single_outputs: SmallVec::new(),
            },
        }
    }

    fn next_param(&self, category: ParamCategory) -> &'a ParamDef {
        let p = &self.params;
        let index = p.single_inputs.len() + p.single_outputs.len();
        let signature: &'a Signature = p.signature;
        assert!(
            index < signature.param_count(),
            "too many arguments for `{}`",
            signature.function_name()
        );
        let param = signature.param(index);
        assert_eq!(
            param.ty.category,
            category,
            "parameter `{}` of `{}` bound with the wrong category",
            param.name,
            signature.function_name()
        );
        param
    }

    pub fn add_readonly_single_input(&mut self, varray: &'a dyn GVArray) {
        let param = self.next_param(ParamCategory::SingleInput);
        assert_eq!(varray.type_descriptor(), param.ty.data_type);
        assert!(varray.len() >= self.params.min_array_size);
        self.params.single_inputs.push(varray);
    }

    pub fn add_uninitialized_single_output(&mut self, span: GMutableSpan<'a>) {
        let param = self.next_param(ParamCategory::SingleOutput);
        assert_eq!(span.type_descriptor(), param.ty.data_type);
        assert!(span.len() >= self.params.min_array_size);
        self.params.single_outputs.push(Some(span));
    }

    pub fn build(self) -> Params<'a> {
        let p = &self.params;
        assert_eq!(
            p.single_inputs.len() + p.single_outputs.len(),
            p.signature.param_count(),
            "missing arguments for `{}`",
            p.signature.function_name()
        );
        self.params
    }
}

impl<'a> Params<'a> {
    pub fn signature(&self) -> &'a Signature {
        self.signature
    }
    pub fn min_array_size(&self) -> usize {
        self.min_array_size
    }

    fn data_index(
        &self,
        param_index: usize,
        name: &str,
        category: ParamCategory,
    ) -> usize {
        let param = self.signature.param(param_index);
        debug_assert_eq!(param.name, name);
        assert_eq!(param.ty.category, category);
        param.data_index
    }

    pub fn readonly_single_input(
        &self,
        param_index: usize,
        name: &str,
    ) -> &'a dyn GVArray {
        let idx =
            self.data_index(param_index, name, ParamCategory::SingleInput);
        self.single_inputs[idx]
    }

    pub fn readonly_single_input_as<T: FieldType>(
        &self,
        param_index: usize,
        name: &str,
    ) -> VArrayView<'a, T> {
        let varray = self.readonly_single_input(param_index, name);
        match VArrayView::new(varray) {
            Some(view) => view,
            None => panic!(
                "input `{name}` is {}, not {}",
                varray.type_descriptor(),
                T::type_descriptor()
            ),
        }
    }

    /// Hands out the storage of an output parameter. Each output can only
    /// be retrieved once per call.
    pub fn uninitialized_single_output(
        &mut self,
        param_index: usize,
        name: &str,
    ) -> GMutableSpan<'a> {
        let idx =
            self.data_index(param_index, name, ParamCategory::SingleOutput);
        match self.single_outputs[idx].take() {
            Some(span) => span,
            None => panic!("output `{name}` was already retrieved"),
        }
    }

    pub fn uninitialized_single_output_as<T: FieldType>(
        &mut self,
        param_index: usize,
        name: &str,
    ) -> &'a mut [MaybeUninit<T>] {
        let span = self.uninitialized_single_output(param_index, name);
        let ty = span.type_descriptor();
        match span.typed::<T>() {
            Some(slice) => slice,
            None => panic!(
                "output `{name}` is {ty}, not {}",
                T::type_descriptor()
            ),
        }
    }
}
