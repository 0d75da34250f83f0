use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Average prices closer than this are treated as equal when classifying
/// MODIFIED positions. Price feeds round floats inconsistently between polls.
pub const PRICE_TOLERANCE: Decimal = dec!(0.0001);

/// Largest magnitude accepted for any number read from the position source.
/// Keeps downstream sums and products inside `Decimal` range.
pub const MAX_SOURCE_MAGNITUDE: Decimal = dec!(1000000000000000);

/// Decimal precision for persisted prices and P&L values
pub const DECIMAL_PRECISION: u32 = 6;

/// Days of snapshots and change records kept by the retention cleanup
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Default number of days shown on the dashboard
pub const DEFAULT_DASHBOARD_DAYS: usize = 7;

/// Default interval between capture passes
pub const DEFAULT_CAPTURE_INTERVAL_SECS: u64 = 60;

/// Separator between symbol and product in an instrument id
pub const INSTRUMENT_KEY_SEPARATOR: char = '|';

/// Storage format for timestamps. Fixed width so lexical order is time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
