// src/connectors/messages.rs
use crate::error::ExchangeError;
use crate::types::{Order, Side, TradeFill};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Open order row from GET /api/v3/openOrders.
/// Числовые поля приходят строками — парсим в Decimal.
#[derive(Debug, Deserialize)]
pub struct OpenOrderRow {
    #[serde(rename = "orderId")]
    pub order_id: u64,

    #[serde(rename = "clientOrderId")]
    pub client_order_id: String,

    pub side: String,

    pub price: Decimal,

    #[serde(rename = "origQty")]
    pub orig_qty: Decimal,

    #[serde(rename = "executedQty")]
    pub executed_qty: Decimal,

    pub time: i64,
}

impl TryFrom<OpenOrderRow> for Order {
    type Error = ExchangeError;

    fn try_from(row: OpenOrderRow) -> Result<Self, Self::Error> {
        let side = Side::from_exchange(&row.side).ok_or_else(|| {
            ExchangeError::MalformedResponse(format!(
                "unknown order side '{}' for orderId {}",
                row.side, row.order_id
            ))
        })?;

        Ok(Order {
            id: row.order_id,
            client_order_id: row.client_order_id,
            side,
            price: row.price,
            quantity: row.orig_qty,
            executed_quantity: row.executed_qty,
            created_at: row.time,
        })
    }
}

/// Fill row from GET /api/v3/myTrades. The wire format has no side field;
/// isBuyer tells whether the fill bought the base asset.
#[derive(Debug, Deserialize)]
pub struct TradeRow {
    pub price: Decimal,

    pub qty: Decimal,

    pub time: i64,

    #[serde(rename = "isBuyer")]
    pub is_buyer: bool,
}

impl From<TradeRow> for TradeFill {
    fn from(row: TradeRow) -> Self {
        TradeFill {
            side: if row.is_buyer { Side::Buy } else { Side::Sell },
            price: row.price,
            quantity: row.qty,
            time: row.time,
        }
    }
}

/// GET /api/v3/avgPrice — short-window mean trade price.
#[derive(Debug, Deserialize)]
pub struct AveragePriceResponse {
    pub mins: u32,
    pub price: Decimal,
}

/// Row from POST /sapi/v3/asset/getUserAsset. Assets the account never
/// held are simply absent from the response.
#[derive(Debug, Deserialize)]
pub struct UserAssetRow {
    pub asset: String,
    pub free: Decimal,
}

/// Acknowledgement from POST /api/v3/order.
#[derive(Debug, Deserialize)]
pub struct OrderAck {
    #[serde(rename = "orderId")]
    pub order_id: u64,

    #[serde(rename = "clientOrderId")]
    pub client_order_id: String,

    pub status: String,
}
