use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{INSTRUMENT_KEY_SEPARATOR, PRICE_TOLERANCE};

/// Canonical key of one instrument within a snapshot.
///
/// Built as `SYMBOL|PRODUCT|STRIKE|TYPE|EXPIRY`, e.g.
/// `NIFTY|NRML|22000|CE|2024-03-28`. Parts the source does not report are
/// left out, so a cash equity keys as `INFY|CNC`. Ordering is lexicographic
/// on the key string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(String);

impl InstrumentId {
    pub fn new(id: impl Into<String>) -> Self {
        InstrumentId(id.into())
    }

    pub fn from_parts(
        symbol: &str,
        product: Option<&str>,
        strike: Option<Decimal>,
        option_type: Option<&str>,
        expiry: Option<NaiveDate>,
    ) -> Self {
        let mut parts = vec![symbol.trim().to_string()];
        parts.extend(
            product
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        );
        parts.extend(strike.map(|s| s.normalize().to_string()));
        parts.extend(
            option_type
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        );
        parts.extend(expiry.map(|e| e.format("%Y-%m-%d").to_string()));
        InstrumentId(parts.join(&INSTRUMENT_KEY_SEPARATOR.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(value: &str) -> Self {
        InstrumentId::new(value)
    }
}

/// One held instrument at one snapshot instant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub instrument_id: InstrumentId,
    pub symbol: String,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub strike: Option<Decimal>,
    #[serde(default)]
    pub option_type: Option<String>,
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    /// Signed quantity; negative means short.
    pub quantity: i64,
    pub average_price: Decimal,
    // Informational fields below are not part of diff classification.
    #[serde(default)]
    pub last_price: Option<Decimal>,
    #[serde(default)]
    pub unrealized_pnl: Decimal,
    #[serde(default)]
    pub booked_pnl: Decimal,
}

impl Position {
    pub fn new(
        symbol: impl Into<String>,
        product: Option<String>,
        quantity: i64,
        average_price: Decimal,
    ) -> Self {
        let symbol = symbol.into();
        Position {
            instrument_id: InstrumentId::from_parts(&symbol, product.as_deref(), None, None, None),
            symbol,
            product,
            strike: None,
            option_type: None,
            expiry: None,
            quantity,
            average_price,
            last_price: None,
            unrealized_pnl: Decimal::ZERO,
            booked_pnl: Decimal::ZERO,
        }
    }

    /// Sets the derivative contract details and re-keys the position.
    pub fn with_contract(
        mut self,
        strike: Option<Decimal>,
        option_type: Option<String>,
        expiry: Option<NaiveDate>,
    ) -> Self {
        self.strike = strike;
        self.option_type = option_type;
        self.expiry = expiry;
        self.instrument_id = InstrumentId::from_parts(
            &self.symbol,
            self.product.as_deref(),
            self.strike,
            self.option_type.as_deref(),
            self.expiry,
        );
        self
    }

    /// True when both positions hold the same quantity at the same average
    /// price (within `PRICE_TOLERANCE`). P&L fields are ignored.
    pub fn is_same_holding(&self, other: &Position) -> bool {
        self.instrument_id == other.instrument_id
            && self.quantity == other.quantity
            && prices_equal(self.average_price, other.average_price)
    }

    pub fn total_pnl(&self) -> Decimal {
        self.unrealized_pnl + self.booked_pnl
    }
}

pub fn prices_equal(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= PRICE_TOLERANCE
}
