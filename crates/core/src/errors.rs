use std::borrow::Cow;

use thiserror::Error;

use crate::multi_function::ParamCategory;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldConstructionError {
    #[error(
        "parameter `{param}` of `{function}` is a {category}, \
         which fields do not support"
    )]
    UnsupportedParamCategory {
        function: Cow<'static, str>,
        param: Cow<'static, str>,
        category: ParamCategory,
    },

    #[error("`{function}` takes {expected} input fields, got {got}")]
    InputCountMismatch {
        function: Cow<'static, str>,
        expected: usize,
        got: usize,
    },

    #[error(
        "input field {index} of `{function}` produces {got}, \
         expected {expected}"
    )]
    InputTypeMismatch {
        function: Cow<'static, str>,
        index: usize,
        expected: &'static str,
        got: &'static str,
    },

    #[error("parameter {param_index} of `{function}` is not a single output")]
    InvalidOutputParam {
        function: Cow<'static, str>,
        param_index: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field produces {got}, expected {expected}")]
pub struct FieldTypeMismatch {
    pub expected: &'static str,
    pub got: &'static str,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldInputError {
    #[error("input {key} was not collected by `prepare_inputs`")]
    UnknownKey { key: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error(transparent)]
    Construction(#[from] FieldConstructionError),

    #[error(transparent)]
    TypeMismatch(#[from] FieldTypeMismatch),

    #[error(transparent)]
    Input(#[from] FieldInputError),
}
