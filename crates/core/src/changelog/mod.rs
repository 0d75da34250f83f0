//! Change log module - change record store, daily log views.

mod changelog_builder;
mod changelog_model;
mod changelog_traits;

pub use changelog_builder::*;
pub use changelog_model::*;
pub use changelog_traits::*;
