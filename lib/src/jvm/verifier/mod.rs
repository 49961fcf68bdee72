//! Register types used when verifying bytecode
//!
//! Every register of a method being verified holds a value whose type the verifier tracks as a
//! [`RegType`]. These types form a lattice: primitive types, the two halves of `long` and
//! `double` values, constants (which remember their value, or at least its range), references
//! to classes, references to objects whose constructor has not run yet, and references to
//! classes that could not be resolved. When control flow from two different places reaches the
//! same instruction, the types of each register get merged into their least upper bound (see
//! [`RegType::merge`]).
//!
//! All register types for one verification pass are created and deduplicated by a
//! [`RegTypeCache`], which also takes care of resolving classes through a [`ClassResolver`].
//! Since there is never more than one type with a given meaning in a cache, types are compared
//! by their cache id.

mod assignability;
mod cache;
mod merge;
mod reg_type;
mod resolver;

pub use cache::*;
pub use reg_type::*;
pub use resolver::*;
