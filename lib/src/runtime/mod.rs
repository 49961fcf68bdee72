//! Runtime objects that generated code refers to through packed patches
mod intrinsic_objects;

pub use intrinsic_objects::*;
