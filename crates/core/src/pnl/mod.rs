//! Daily P&L metrics derived from stored snapshots.

mod pnl_model;
mod pnl_service;

pub use pnl_model::DailyPnlMetrics;
pub use pnl_service::PnlService;
