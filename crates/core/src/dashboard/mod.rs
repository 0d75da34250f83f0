//! Dashboard views - per-profile activity matrix and P&L annotated day logs.

mod dashboard_model;
mod dashboard_service;

pub use dashboard_model::*;
pub use dashboard_service::DashboardService;
