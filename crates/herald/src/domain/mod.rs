//! Domain Layer
//!
//! Relay records, value objects and errors, free of transport concerns.

pub mod entities;
pub mod errors;
pub mod value_objects;

// Re-exports for convenience
pub use entities::*;
pub use errors::*;
pub use value_objects::*;
