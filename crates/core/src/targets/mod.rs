//! Targets module - derivation of target metrics, scope aggregation and
//! delta editing.

mod derivation;
mod scope;
mod targets_model;
mod targets_service;
mod targets_traits;

pub use derivation::derive_metrics;
pub use scope::{Scope, ScopeKind};
pub use targets_model::*;
pub use targets_service::TargetService;
pub use targets_traits::TargetServiceTrait;

#[cfg(test)]
mod targets_service_tests;
