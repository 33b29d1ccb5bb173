//! Sales Targets Core - Domain entities, services, and traits.
//!
//! This crate contains the target computation engine: fact aggregation,
//! delta resolution, metric derivation, scope aggregation and visibility
//! filtering. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate.

pub mod aggregation;
pub mod constants;
pub mod deltas;
pub mod errors;
pub mod facts;
pub mod targets;
pub mod utils;
pub mod visibility;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
