//! SQLite storage implementation for the sales targets engine.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the delta store trait defined in `sales-targets-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The single-writer actor serializing upserts
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the workspace where Diesel dependencies exist.
//! The core crate is database-agnostic and works with traits.
//!
//! ```text
//!        core (domain)
//!              │
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```

pub mod db;
pub mod deltas;
pub mod errors;
pub mod schema;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

pub use deltas::DeltaRepository;

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from sales-targets-core for convenience
pub use sales_targets_core::errors::{DatabaseError, Error, Result};
