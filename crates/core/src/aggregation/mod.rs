//! Class and item aggregation over a filtered fact set.

mod aggregation_model;
mod aggregator;

pub use aggregation_model::*;
pub use aggregator::*;
