//! Retention cleanup and manual deletion of stored history.

mod retention_service;

pub use retention_service::{DeletionReport, RetentionService};
