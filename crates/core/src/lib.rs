#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::type_complexity)]

#[macro_use]
extern crate static_assertions;

extern crate indexmap;
extern crate log;
extern crate smallvec;
extern crate thiserror;

// used by `impl_field_type!` expansions in downstream crates
#[doc(hidden)]
pub extern crate once_cell;

#[macro_use]
pub mod types;
pub mod errors;
pub mod field;
pub mod index_mask;
pub mod multi_function;
pub mod utils;
pub mod virtual_array;
