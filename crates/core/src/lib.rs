//! Tradewatch Core - Domain entities, services, and traits.
//!
//! This crate contains the snapshot-diff engine and the services built on
//! it. It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod capture;
pub mod changelog;
pub mod constants;
pub mod dashboard;
pub mod diff;
pub mod errors;
pub mod pnl;
pub mod positions;
pub mod profiles;
pub mod retention;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the engine types used across crates
pub use diff::*;
pub use positions::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
