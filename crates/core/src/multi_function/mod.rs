pub mod custom;
pub mod params;
pub mod signature;

use crate::index_mask::IndexMask;

pub use custom::{CustomMfConstant, CustomMfSiSiSo, CustomMfSiSo};
pub use params::{Params, ParamsBuilder};
pub use signature::{
    ParamCategory, ParamDef, ParamType, Signature, SignatureBuilder,
};

/// A function that processes many elements per call.
///
/// # Safety
/// When `call` returns normally, every element of every single output
/// parameter must have been initialized exactly once for every index in
/// `mask`. Callers rely on this to read and later destruct those
/// elements. Unwinding out of `call` is allowed, the caller then treats
/// all outputs as uninitialized.
pub unsafe trait MultiFunction: Send + Sync {
    fn signature(&self) -> &Signature;
    fn call(&self, mask: IndexMask, params: &mut Params);

    fn name(&self) -> &str {
        self.signature().function_name()
    }
}
