//! Domain layer types and invariants.

pub mod error;
pub mod favicon;
pub mod types;
