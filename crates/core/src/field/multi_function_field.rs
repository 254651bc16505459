use std::{borrow::Cow, sync::Arc};

use smallvec::SmallVec;

use crate::{
    errors::FieldConstructionError,
    index_mask::IndexMask,
    multi_function::{MultiFunction, ParamCategory, ParamsBuilder},
    types::TypeDescriptor,
    virtual_array::{GBuffer, GVArrayForOwnedGSpan},
};

use super::{FieldInputs, GField, GFieldOutput, GFieldRef};

/// Combines the outputs of its input fields through a multi-function.
///
/// Input fields are matched to the single input parameters of the
/// function's signature in order. The field's value is the single output
/// parameter at `output_param_index`, all other outputs are discarded.
pub struct MultiFunctionField {
    input_fields: SmallVec<[GFieldRef; 4]>,
    function: Arc<dyn MultiFunction>,
    output_param_index: usize,
}

impl MultiFunctionField {
    pub fn try_new(
        input_fields: impl IntoIterator<Item = GFieldRef>,
        function: Arc<dyn MultiFunction>,
        output_param_index: usize,
    ) -> Result<Self, FieldConstructionError> {
        let input_fields = input_fields
            .into_iter()
            .collect::<SmallVec<[GFieldRef; 4]>>();
        let signature = function.signature();
        let function_name =
            || Cow::Owned(signature.function_name().to_owned());

        for param in signature.params() {
            match param.ty.category {
                ParamCategory::SingleInput | ParamCategory::SingleOutput => (),
                category => {
                    return Err(
                        FieldConstructionError::UnsupportedParamCategory {
                            function: function_name(),
                            param: param.name.clone(),
                            category,
                        },
                    )
                }
            }
        }
        if input_fields.len() != signature.single_input_count() {
            return Err(FieldConstructionError::InputCountMismatch {
                function: function_name(),
                expected: signature.single_input_count(),
                got: input_fields.len(),
            });
        }
        let input_params = signature
            .params()
            .iter()
            .filter(|p| p.ty.category == ParamCategory::SingleInput);
        for (index, (field, param)) in
            input_fields.iter().zip(input_params).enumerate()
        {
            if field.output_type() != param.ty.data_type {
                return Err(FieldConstructionError::InputTypeMismatch {
                    function: function_name(),
                    index,
                    expected: param.ty.data_type.name(),
                    got: field.output_type().name(),
                });
            }
        }
        let output_is_valid = output_param_index < signature.param_count()
            && signature.param(output_param_index).ty.category
                == ParamCategory::SingleOutput;
        if !output_is_valid {
            return Err(FieldConstructionError::InvalidOutputParam {
                function: function_name(),
                param_index: output_param_index,
            });
        }

        Ok(Self {
            input_fields,
            function,
            output_param_index,
        })
    }

    /// Like [`try_new`](Self::try_new), but a malformed graph is a panic.
    pub fn new(
        input_fields: impl IntoIterator<Item = GFieldRef>,
        function: Arc<dyn MultiFunction>,
        output_param_index: usize,
    ) -> Self {
        match Self::try_new(input_fields, function, output_param_index) {
            Ok(field) => field,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn function(&self) -> &dyn MultiFunction {
        &*self.function
    }
    pub fn input_fields(&self) -> &[GFieldRef] {
        &self.input_fields
    }
    pub fn output_param_index(&self) -> usize {
        self.output_param_index
    }
}

/// Storage for one output parameter during a single evaluation.
///
/// Elements only count as initialized once the function returned, so an
/// unwinding call releases the memory without running destructors.
struct OutputSlot<'a> {
    buffer: Option<GBuffer>,
    initialized: Option<IndexMask<'a>>,
}

impl<'a> OutputSlot<'a> {
    fn new(ty: &'static TypeDescriptor, len: usize) -> Self {
        Self {
            buffer: Some(GBuffer::allocate(ty, len)),
            initialized: None,
        }
    }

    fn into_varray(mut self) -> GVArrayForOwnedGSpan<'a> {
        let (Some(buffer), Some(mask)) =
            (self.buffer.take(), self.initialized.take())
        else {
            unreachable!("result taken before the function returned")
        };
        // SAFETY: the multi-function contract initialized every masked
        // element of this output
        unsafe { GVArrayForOwnedGSpan::new(buffer, mask) }
    }
}

impl Drop for OutputSlot<'_> {
    fn drop(&mut self) {
        let (Some(buffer), Some(mask)) = (&mut self.buffer, self.initialized)
        else {
            return;
        };
        let ty = buffer.type_descriptor();
        // SAFETY: masked elements were initialized by the function
        unsafe { ty.destruct_indices(buffer.as_mut_ptr(), mask) }
    }
}

impl GField for MultiFunctionField {
    fn output_type(&self) -> &'static TypeDescriptor {
        self.function
            .signature()
            .param(self.output_param_index)
            .ty
            .data_type
    }

    fn foreach_input_field<'a>(
        &'a self,
        visit: &mut dyn FnMut(&'a GFieldRef),
    ) {
        for field in &self.input_fields {
            visit(field);
        }
    }

    fn evaluate_generic<'a>(
        &'a self,
        mask: IndexMask<'a>,
        inputs: &'a FieldInputs<'a>,
    ) -> GFieldOutput<'a> {
        let signature = self.function.signature();
        let array_size = mask.min_array_size();
        log::trace!(
            "evaluating `{}` over {} indices",
            signature.function_name(),
            mask.len()
        );

        let input_outputs = self
            .input_fields
            .iter()
            .map(|field| field.evaluate_generic(mask, inputs))
            .collect::<SmallVec<[_; 4]>>();

        let mut outputs = SmallVec::<[OutputSlot; 2]>::new();
        let mut result_slot = None;
        for (param_index, param) in signature.params().iter().enumerate() {
            if param.ty.category != ParamCategory::SingleOutput {
                continue;
            }
            if param_index == self.output_param_index {
                result_slot = Some(outputs.len());
            }
            outputs.push(OutputSlot::new(param.ty.data_type, array_size));
        }
        let Some(result_slot) = result_slot else {
            unreachable!("output parameter validated on construction")
        };

        {
            let mut builder = ParamsBuilder::new(signature, array_size);
            let mut next_input = input_outputs.iter();
            let mut next_output = outputs.iter_mut();
            for param in signature.params() {
                match param.ty.category {
                    ParamCategory::SingleInput => {
                        let Some(input) = next_input.next() else {
                            unreachable!("input count validated")
                        };
                        builder.add_readonly_single_input(input.varray_ref());
                    }
                    ParamCategory::SingleOutput => {
                        let Some(OutputSlot {
                            buffer: Some(buffer),
                            ..
                        }) = next_output.next()
                        else {
                            unreachable!("one slot per output parameter")
                        };
                        builder.add_uninitialized_single_output(
                            buffer.as_mut_span(),
                        );
                    }
                    category => panic!(
                        "{category} parameter `{}` of `{}` is not supported \
                         in fields",
                        param.name,
                        signature.function_name()
                    ),
                }
            }
            self.function.call(mask, &mut builder.build());
        }

        for slot in &mut outputs {
            slot.initialized = Some(mask);
        }
        let result = outputs.swap_remove(result_slot).into_varray();
        log::trace!(
            "discarding {} auxiliary outputs of `{}`",
            outputs.len(),
            signature.function_name()
        );
        drop(outputs);
        GFieldOutput::owned(result)
    }
}
