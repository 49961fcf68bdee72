mod bit_field;
mod bit_vector;
mod ref_id;

pub use bit_field::*;
pub use bit_vector::*;
pub use ref_id::*;
