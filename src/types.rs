// src/types.rs
use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Parses the side string the exchange reports ("BUY"/"SELL").
    pub fn from_exchange(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("BUY") {
            Some(Side::Buy)
        } else if s.eq_ignore_ascii_case("SELL") {
            Some(Side::Sell)
        } else {
            None
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single traded pair, e.g. BTCUSDT = BTC (base) / USDT (quote).
#[derive(Debug, Clone)]
pub struct Pair {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
}

/// Snapshot of an open order as the exchange reports it. Fetched fresh
/// every cycle, never cached across cycles.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: u64,
    pub client_order_id: String,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub executed_quantity: Decimal,
    /// Creation time, milliseconds since epoch.
    pub created_at: i64,
}

impl Order {
    pub fn is_unfilled(&self) -> bool {
        self.executed_quantity.is_zero()
    }
}

/// An executed trade from the account's history. The last fill tells the
/// engine which side to take next and at what reference price.
#[derive(Debug, Clone)]
pub struct TradeFill {
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    /// Execution time, milliseconds since epoch.
    pub time: i64,
}
