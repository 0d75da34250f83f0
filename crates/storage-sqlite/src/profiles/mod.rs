//! SQLite storage implementation for monitored profiles.

mod model;
mod repository;

pub use model::ProfileDB;
pub use repository::ProfileRepository;
