use std::borrow::Cow;

use derive_more::Display;
use smallvec::SmallVec;

use crate::types::{FieldType, TypeDescriptor};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum ParamCategory {
    #[display("single input")]
    SingleInput,
    #[display("single output")]
    SingleOutput,
    #[display("single mutable")]
    SingleMutable,
    #[display("vector input")]
    VectorInput,
    #[display("vector mutable")]
    VectorMutable,
    #[display("vector output")]
    VectorOutput,
}

/// Category plus element type of a parameter. For vector categories the
/// data type is the type of the vector's elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamType {
    pub category: ParamCategory,
    pub data_type: &'static TypeDescriptor,
}

impl ParamType {
    pub fn new(
        category: ParamCategory,
        data_type: &'static TypeDescriptor,
    ) -> Self {
        Self {
            category,
            data_type,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParamDef {
    pub name: Cow<'static, str>,
    pub ty: ParamType,
    // position among the params of the same category
    pub(crate) data_index: usize,
}

#[derive(Clone, Debug)]
pub struct Signature {
    function_name: Cow<'static, str>,
    params: SmallVec<[ParamDef; 4]>,
    single_input_count: usize,
    single_output_count: usize,
}

impl Signature {
    pub fn build(
        function_name: impl Into<Cow<'static, str>>,
    ) -> SignatureBuilder {
        SignatureBuilder {
            signature: Signature {
                function_name: function_name.into(),
                params: SmallVec::new(),
                single_input_count: 0,
                single_output_count: 0,
            },
            other_counts: [0; 4],
        }
    }
    pub fn function_name(&self) -> &str {
        &self.function_name
    }
    pub fn params(&self) -> &[ParamDef] {
        &self.params
    }
    pub fn param(&self, param_index: usize) -> &ParamDef {
        &self.params[param_index]
    }
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
    pub fn single_input_count(&self) -> usize {
        self.single_input_count
    }
    pub fn single_output_count(&self) -> usize {
        self.single_output_count
    }
}

pub struct SignatureBuilder {
    signature: Signature,
    // data indices for the categories that have no dedicated counter
    other_counts: [usize; 4],
}

impl SignatureBuilder {
    pub fn param(
        mut self,
        name: impl Into<Cow<'static, str>>,
        ty: ParamType,
    ) -> Self {
        let sig = &mut self.signature;
        let counter = match ty.category {
            ParamCategory::SingleInput => &mut sig.single_input_count,
            ParamCategory::SingleOutput => &mut sig.single_output_count,
            ParamCategory::SingleMutable => &mut self.other_counts[0],
            ParamCategory::VectorInput => &mut self.other_counts[1],
            ParamCategory::VectorMutable => &mut self.other_counts[2],
            ParamCategory::VectorOutput => &mut self.other_counts[3],
        };
        let data_index = *counter;
        *counter += 1;
        sig.params.push(ParamDef {
            name: name.into(),
            ty,
            data_index,
        });
        self
    }
    pub fn single_input<T: FieldType>(
        self,
        name: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.single_input_of(name, T::type_descriptor())
    }
    pub fn single_input_of(
        self,
        name: impl Into<Cow<'static, str>>,
        data_type: &'static TypeDescriptor,
    ) -> Self {
        self.param(name, ParamType::new(ParamCategory::SingleInput, data_type))
    }
    pub fn single_output<T: FieldType>(
        self,
        name: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.single_output_of(name, T::type_descriptor())
    }
    pub fn single_output_of(
        self,
        name: impl Into<Cow<'static, str>>,
        data_type: &'static TypeDescriptor,
    ) -> Self {
        self.param(name, ParamType::new(ParamCategory::SingleOutput, data_type))
    }
    pub fn finish(self) -> Signature {
        self.signature
    }
}

#[cfg(test)]
mod tests {
    use crate::types::FieldType;

    use super::{ParamCategory, ParamType, Signature};

    #[test]
    fn data_indices_are_per_category() {
        let sig = Signature::build("divmod")
            .single_input::<i32>("A")
            .single_output::<i32>("Quotient")
            .single_input::<i32>("B")
            .param(
                "Vec",
                ParamType::new(
                    ParamCategory::VectorInput,
                    i32::type_descriptor(),
                ),
            )
            .single_output::<i32>("Remainder")
            .finish();
        let data_indices =
            sig.params().iter().map(|p| p.data_index).collect::<Vec<_>>();
        assert_eq!(data_indices, [0, 0, 1, 0, 1]);
        assert_eq!(sig.single_input_count(), 2);
        assert_eq!(sig.single_output_count(), 2);
        assert_eq!(sig.param(4).name, "Remainder");
    }

    #[test]
    fn category_display() {
        assert_eq!(ParamCategory::VectorMutable.to_string(), "vector mutable");
    }
}
