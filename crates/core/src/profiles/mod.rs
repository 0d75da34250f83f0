//! Profiles module - monitored profiles and the profile list file.

mod profiles_model;
mod profiles_service;
mod profiles_traits;

pub use profiles_model::{parse_profile_list, NewProfile, Profile};
pub use profiles_service::ProfileService;
pub use profiles_traits::{ProfileRepositoryTrait, ProfileServiceTrait};
