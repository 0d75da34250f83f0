//! Snapshot diff engine - classification, reconstruction, change records.

mod diff_engine;
mod diff_model;
mod reconstruction;

pub use diff_engine::*;
pub use diff_model::*;
pub use reconstruction::*;

#[cfg(test)]
mod diff_engine_tests;
