//! JVM class model consumed by the verifier
//!
//! Classes are identified by their descriptor inside a class loader, carry their super types and
//! access flags, and go through a short lifecycle (loaded, then resolved or erroneous). The [`class_graph::ClassGraph`] holds all of
//! this in arenas so that the rest of the crate can pass around cheap [`class_graph::ClassId`]
//! handles, and [`verifier`] builds the register type lattice on top of it.

mod access_flags;
pub mod class_graph;
mod descriptors;
mod errors;
mod names;
pub mod verifier;

pub use access_flags::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
