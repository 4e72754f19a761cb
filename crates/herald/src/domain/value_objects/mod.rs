//! Value Objects
//!
//! Immutable types defined by their value.

mod interaction_id;
mod topic;

pub use interaction_id::*;
pub use topic::*;
