//! Capture module - fetching, diffing and persisting snapshots per profile,
//! and the per-profile capture sessions that drive it.

mod capture_service;
mod capture_session;
mod capture_traits;
mod http_source;

pub use capture_service::{CaptureOutcome, CaptureReport, CaptureService};
pub use capture_session::{CaptureScheduler, CaptureSession, SessionChange, SessionStatus};
pub use capture_traits::PositionSourceTrait;
pub use http_source::{parse_response, HttpPositionSource};

#[cfg(test)]
mod capture_service_tests;
