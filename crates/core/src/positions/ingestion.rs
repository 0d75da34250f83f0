//! Ingestion of the raw live-positions payload into validated positions.
//!
//! The source reports individual trades. Trades sharing an instrument id are
//! merged: quantities and P&L are summed and the average price becomes the
//! quantity-weighted average of the merged trades.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{InstrumentId, Position, Snapshot};
use crate::constants::MAX_SOURCE_MAGNITUDE;
use crate::errors::{Result, ValidationError};

/// `position_snapshot_data` object of the live-positions payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPositionSnapshot {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub data: Vec<RawPositionGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPositionGroup {
    #[serde(default)]
    pub trades: Vec<RawTrade>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTrade {
    #[serde(default)]
    pub trading_symbol: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub average_price: Option<Value>,
    #[serde(default)]
    pub last_price: Option<Value>,
    #[serde(default)]
    pub unbooked_pnl: Option<Value>,
    #[serde(default)]
    pub booked_profit_loss: Option<Value>,
    #[serde(default)]
    pub instrument_info: Option<RawInstrumentInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInstrumentInfo {
    #[serde(default)]
    pub strike: Option<Value>,
    #[serde(default)]
    pub instrument_type: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
}

/// Flattens and validates the trades of a raw payload into one position per
/// instrument id, in instrument id order.
pub fn normalize_positions(raw: &RawPositionSnapshot) -> Result<Vec<Position>> {
    let mut merged: BTreeMap<InstrumentId, Position> = BTreeMap::new();

    for trade in raw.data.iter().flat_map(|group| group.trades.iter()) {
        let incoming = position_from_trade(trade)?;
        match merged.get_mut(&incoming.instrument_id) {
            Some(existing) => merge_into(existing, incoming)?,
            None => {
                merged.insert(incoming.instrument_id.clone(), incoming);
            }
        }
    }

    Ok(merged.into_values().collect())
}

impl Snapshot {
    /// Builds a validated snapshot from a raw live-positions payload.
    pub fn from_raw(
        profile_id: impl Into<String>,
        captured_at: DateTime<Utc>,
        raw: &RawPositionSnapshot,
    ) -> Result<Snapshot> {
        let positions = normalize_positions(raw)?;
        Ok(Snapshot::new(profile_id, captured_at, positions)?
            .with_source_created_at(raw.created_at.clone()))
    }
}

fn position_from_trade(trade: &RawTrade) -> Result<Position> {
    let symbol = trade
        .trading_symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ValidationError::MissingField("trading_symbol".to_string()))?;

    let quantity = match trade.quantity.as_ref() {
        Some(value) if !value.is_null() => parse_quantity(value)?,
        _ => return Err(ValidationError::MissingField("quantity".to_string()).into()),
    };

    let average_price = optional_decimal("average_price", trade.average_price.as_ref())?
        .ok_or_else(|| ValidationError::MissingField("average_price".to_string()))?;

    let info = trade.instrument_info.clone().unwrap_or_default();
    let product = trade
        .product
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let strike = optional_decimal("strike", info.strike.as_ref())?;
    let option_type = info
        .instrument_type
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    let expiry = info.expiry.as_deref().map(parse_expiry).transpose()?;

    let mut position = Position::new(symbol, product, quantity, average_price)
        .with_contract(strike, option_type, expiry);
    position.last_price = optional_decimal("last_price", trade.last_price.as_ref())?;
    position.unrealized_pnl =
        optional_decimal("unbooked_pnl", trade.unbooked_pnl.as_ref())?.unwrap_or(Decimal::ZERO);
    position.booked_pnl = optional_decimal("booked_profit_loss", trade.booked_profit_loss.as_ref())?
        .unwrap_or(Decimal::ZERO);
    Ok(position)
}

fn merge_into(existing: &mut Position, incoming: Position) -> Result<()> {
    let instrument_id = existing.instrument_id.clone();
    let overflow = || {
        ValidationError::InvalidInput(format!(
            "merged position for {} is out of range",
            instrument_id
        ))
    };
    let total_value = existing
        .average_price
        .checked_mul(Decimal::from(existing.quantity))
        .zip(
            incoming
                .average_price
                .checked_mul(Decimal::from(incoming.quantity)),
        )
        .and_then(|(a, b)| a.checked_add(b))
        .ok_or_else(overflow)?;
    let quantity = existing
        .quantity
        .checked_add(incoming.quantity)
        .ok_or_else(overflow)?;
    let unrealized_pnl = existing
        .unrealized_pnl
        .checked_add(incoming.unrealized_pnl)
        .ok_or_else(overflow)?;
    let booked_pnl = existing
        .booked_pnl
        .checked_add(incoming.booked_pnl)
        .ok_or_else(overflow)?;
    if quantity != 0 {
        existing.average_price = total_value
            .checked_div(Decimal::from(quantity))
            .ok_or_else(overflow)?;
    }
    existing.quantity = quantity;
    existing.unrealized_pnl = unrealized_pnl;
    existing.booked_pnl = booked_pnl;
    if incoming.last_price.is_some() {
        existing.last_price = incoming.last_price;
    }
    Ok(())
}

fn parse_quantity(value: &Value) -> Result<i64> {
    let decimal = parse_decimal("quantity", value)?;
    if !decimal.fract().is_zero() {
        return Err(ValidationError::InvalidInput(format!(
            "quantity must be a whole number, got {}",
            decimal
        ))
        .into());
    }
    decimal.to_i64().ok_or_else(|| {
        ValidationError::InvalidInput(format!("quantity {} is out of range", decimal)).into()
    })
}

fn optional_decimal(field: &str, value: Option<&Value>) -> Result<Option<Decimal>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_decimal(field, value).map(Some),
    }
}

fn parse_decimal(field: &str, value: &Value) -> Result<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(ValidationError::InvalidInput(format!(
                "{} must be numeric, got {}",
                field, other
            ))
            .into())
        }
    };
    let value = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| {
            ValidationError::InvalidInput(format!("{} must be numeric, got '{}'", field, text))
        })?;
    if value.abs() > MAX_SOURCE_MAGNITUDE {
        return Err(ValidationError::InvalidInput(format!(
            "{} {} is out of range",
            field, value
        ))
        .into());
    }
    Ok(value)
}

fn parse_expiry(value: &str) -> Result<NaiveDate> {
    let date_part = value.get(..10).unwrap_or(value);
    Ok(NaiveDate::parse_from_str(date_part, "%Y-%m-%d")?)
}
