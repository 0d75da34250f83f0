//! Positions module - position and snapshot models, ingestion, store traits.

mod ingestion;
mod positions_model;
mod snapshot_model;
mod snapshot_traits;

pub use ingestion::*;
pub use positions_model::*;
pub use snapshot_model::*;
pub use snapshot_traits::*;
