//! SQLite storage implementation for change records and capture failures.

mod model;
mod repository;

pub use model::{CaptureFailureDB, ChangeRecordDB};
pub use repository::ChangeRecordRepository;

// Re-export trait from core for convenience
pub use tradewatch_core::changelog::ChangeRecordRepositoryTrait;
