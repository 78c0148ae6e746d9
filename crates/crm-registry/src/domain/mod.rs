//! # Domain Module
//!
//! Entities, value objects, errors and input invariants of the registry.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use value_objects::*;
