//! SQLite storage implementation for Tradewatch.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `tradewatch-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for profiles, snapshots and change records
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
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
//!
//! All writes go through a single writer actor (`WriteHandle`); reads use
//! the connection pool directly.

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod changes;
pub mod profiles;
pub mod snapshots;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from tradewatch-core for convenience
pub use tradewatch_core::errors::{DatabaseError, Error, Result};
