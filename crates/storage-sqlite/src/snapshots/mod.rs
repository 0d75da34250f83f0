//! SQLite storage implementation for position snapshots.

mod model;
mod repository;

pub use model::SnapshotDB;
pub use repository::SnapshotRepository;

// Re-export trait from core for convenience
pub use tradewatch_core::positions::SnapshotRepositoryTrait;
