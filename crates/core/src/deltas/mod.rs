//! Deltas module - persisted quantity overrides, the store contract and
//! effective-delta resolution.

mod delta_snapshot;
mod deltas_model;
mod deltas_traits;
mod memory_repository;
mod resolver;

pub use delta_snapshot::{DeltaSnapshot, UserDeltas};
pub use deltas_model::*;
pub use deltas_traits::DeltaRepositoryTrait;
pub use memory_repository::InMemoryDeltaRepository;
pub use resolver::{resolve_class_delta, DeltaResolver};
