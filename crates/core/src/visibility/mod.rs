//! Visibility module - typed permission sets and column redaction of the
//! derived tables.

mod filter;
mod visibility_model;

pub use filter::*;
pub use visibility_model::*;
