//! Register type lattice and type cache for verifying JVM bytecode
//!
//! The crate is split into:
//!
//!   - [`jvm`]: an in-memory class graph (loaders, classes, arrays, assignability) and the
//!     [`jvm::verifier`] register types built on top of it
//!   - [`runtime`]: packed references to the boxed value caches used by generated code
//!   - [`util`]: bit sets, bit fields, and reference-identity wrappers
//!
pub mod jvm;
pub mod runtime;
pub mod util;
