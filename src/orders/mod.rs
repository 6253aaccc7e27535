// src/orders/mod.rs
use crate::connectors::binance::BinanceClient;
use crate::connectors::messages::{OpenOrderRow, OrderAck, TradeRow};
use crate::error::ExchangeError;
use crate::types::{Order, Pair, Side, TradeFill};
use async_trait::async_trait;
use reqwest::Method;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// What `check_and_expire` decided about an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFate {
    Expired,
    StillLive,
}

/// Order queries and mutations the engine drives. Trait so the engine can
/// be tested against a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Open orders for the pair, sorted by creation time ascending. The
    /// first element is treated as "the" active order, so the ordering is
    /// enforced here rather than assumed from the exchange response.
    async fn open_orders(&self) -> Result<Vec<Order>, ExchangeError>;

    /// Last executed trade, or `None` when the account has no history.
    async fn last_trade(&self) -> Result<Option<TradeFill>, ExchangeError>;

    /// Places a LIMIT/GTC order. Fails with `ZeroQuantity` before touching
    /// the transport when `quantity <= 0`.
    async fn place(
        &self,
        side: Side,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<(), ExchangeError>;

    /// Cancels by client-assigned order id.
    async fn cancel(&self, order: &Order) -> Result<(), ExchangeError>;

    /// Cancels `order` if `created_at + lifetime_ms <= now_ms` (expiry at
    /// exactly the boundary counts as expired). No-op otherwise.
    async fn check_and_expire(
        &self,
        order: &Order,
        now_ms: i64,
        lifetime_ms: i64,
    ) -> Result<OrderFate, ExchangeError>;
}

pub struct BinanceOrderRepository {
    client: Arc<BinanceClient>,
    pair: Pair,
}

impl BinanceOrderRepository {
    pub fn new(client: Arc<BinanceClient>, pair: Pair) -> Self {
        Self { client, pair }
    }
}

#[async_trait]
impl OrderRepository for BinanceOrderRepository {
    async fn open_orders(&self) -> Result<Vec<Order>, ExchangeError> {
        let rows: Vec<OpenOrderRow> = self
            .client
            .request(
                Method::GET,
                "/api/v3/openOrders",
                vec![("symbol", self.pair.symbol.clone())],
                true,
            )
            .await?;

        let mut orders = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        orders.sort_by_key(|order| order.created_at);
        Ok(orders)
    }

    async fn last_trade(&self) -> Result<Option<TradeFill>, ExchangeError> {
        let rows: Vec<TradeRow> = self
            .client
            .request(
                Method::GET,
                "/api/v3/myTrades",
                vec![("symbol", self.pair.symbol.clone())],
                true,
            )
            .await?;

        Ok(rows.into_iter().last().map(TradeFill::from))
    }

    async fn place(
        &self,
        side: Side,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<(), ExchangeError> {
        if quantity <= Decimal::ZERO {
            return Err(ExchangeError::ZeroQuantity { side });
        }

        // The exchange was deployed with whole-unit prices; truncation is
        // kept for compatibility, not rounded to a tick size.
        let price = price.trunc();

        let params = vec![
            ("symbol", self.pair.symbol.clone()),
            ("side", side.as_str().to_string()),
            ("type", "LIMIT".to_string()),
            ("timeInForce", "GTC".to_string()),
            ("price", price.to_string()),
            ("quantity", quantity.to_string()),
        ];

        let ack: OrderAck = self
            .client
            .request(Method::POST, "/api/v3/order", params, true)
            .await?;

        info!(
            "Order accepted - side: {}, price: {}, quantity: {}, orderId: {}, status: {}",
            side, price, quantity, ack.order_id, ack.status
        );
        Ok(())
    }

    async fn cancel(&self, order: &Order) -> Result<(), ExchangeError> {
        let params = vec![
            ("symbol", self.pair.symbol.clone()),
            ("origClientOrderId", order.client_order_id.clone()),
        ];

        let _: serde_json::Value = self
            .client
            .request(Method::DELETE, "/api/v3/order", params, true)
            .await?;

        info!("Order canceled, clientOrderId: {}", order.client_order_id);
        Ok(())
    }

    async fn check_and_expire(
        &self,
        order: &Order,
        now_ms: i64,
        lifetime_ms: i64,
    ) -> Result<OrderFate, ExchangeError> {
        if order.created_at + lifetime_ms <= now_ms {
            info!(
                "Order {} outlived its {} ms lifetime, canceling",
                order.client_order_id, lifetime_ms
            );
            self.cancel(order).await?;
            Ok(OrderFate::Expired)
        } else {
            Ok(OrderFate::StillLive)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromStr;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo_for(server: &MockServer) -> BinanceOrderRepository {
        let client = Arc::new(BinanceClient::with_base_url(
            "k".to_string(),
            "s".to_string(),
            60_000,
            server.uri(),
        ));
        let pair = Pair {
            symbol: "BTCUSDT".to_string(),
            base_asset: "BTC".to_string(),
            quote_asset: "USDT".to_string(),
        };
        BinanceOrderRepository::new(client, pair)
    }

    fn order(client_order_id: &str, created_at: i64) -> Order {
        Order {
            id: 7,
            client_order_id: client_order_id.to_string(),
            side: Side::Buy,
            price: Decimal::from(100),
            quantity: Decimal::ONE,
            executed_quantity: Decimal::ZERO,
            created_at,
        }
    }

    #[tokio::test]
    async fn zero_quantity_never_reaches_the_transport() {
        let server = MockServer::start().await;
        let repo = repo_for(&server);

        let result = repo
            .place(Side::Buy, Decimal::from(100), Decimal::ZERO)
            .await;
        assert!(matches!(
            result,
            Err(ExchangeError::ZeroQuantity { side: Side::Buy })
        ));

        let result = repo
            .place(Side::Sell, Decimal::from(100), Decimal::from(-1))
            .await;
        assert!(matches!(
            result,
            Err(ExchangeError::ZeroQuantity { side: Side::Sell })
        ));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn place_truncates_price_to_whole_units() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/order"))
            .and(query_param("price", "27123"))
            .and(query_param("side", "BUY"))
            .and(query_param("type", "LIMIT"))
            .and(query_param("timeInForce", "GTC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orderId": 1, "clientOrderId": "abc", "status": "NEW"
            })))
            .expect(1)
            .mount(&server)
            .await;

        repo_for(&server)
            .place(
                Side::Buy,
                Decimal::from_str("27123.78").unwrap(),
                Decimal::from_str("0.005").unwrap(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn open_orders_come_back_sorted_by_creation_time() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/openOrders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "orderId": 2, "clientOrderId": "newer", "side": "BUY",
                    "price": "90", "origQty": "1", "executedQty": "0",
                    "time": 2000i64
                },
                {
                    "orderId": 1, "clientOrderId": "older", "side": "SELL",
                    "price": "110", "origQty": "1", "executedQty": "0",
                    "time": 1000i64
                }
            ])))
            .mount(&server)
            .await;

        let orders = repo_for(&server).open_orders().await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].client_order_id, "older");
        assert_eq!(orders[1].client_order_id, "newer");
    }

    #[tokio::test]
    async fn last_trade_is_none_without_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/myTrades"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(repo_for(&server).last_trade().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn last_trade_takes_the_final_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/myTrades"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"price": "95", "qty": "1", "time": 1, "isBuyer": true},
                {"price": "101", "qty": "2", "time": 2, "isBuyer": false}
            ])))
            .mount(&server)
            .await;

        let fill = repo_for(&server).last_trade().await.unwrap().unwrap();
        assert_eq!(fill.side, Side::Sell);
        assert_eq!(fill.price, Decimal::from(101));
        assert_eq!(fill.quantity, Decimal::from(2));
    }

    #[tokio::test]
    async fn expiry_is_boundary_inclusive() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v3/order"))
            .and(query_param("origClientOrderId", "stale"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "CANCELED"})))
            .expect(1)
            .mount(&server)
            .await;

        let repo = repo_for(&server);
        let now = 1_700_000_060_000;

        // created exactly lifetime ago: expired (inclusive boundary)
        let fate = repo
            .check_and_expire(&order("stale", now - 60_000), now, 60_000)
            .await
            .unwrap();
        assert_eq!(fate, OrderFate::Expired);
    }

    #[tokio::test]
    async fn order_inside_lifetime_is_left_alone() {
        let server = MockServer::start().await;
        let repo = repo_for(&server);
        let now = 1_700_000_060_000;

        let fate = repo
            .check_and_expire(&order("fresh", now - 59_999), now, 60_000)
            .await
            .unwrap();
        assert_eq!(fate, OrderFate::StillLive);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
