pub use fieldline_core::*;
