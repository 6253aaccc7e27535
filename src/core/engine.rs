// src/core/engine.rs
use crate::config::AppConfig;
use crate::error::ExchangeError;
use crate::market::MarketData;
use crate::orders::{OrderFate, OrderRepository};
use crate::types::{Order, Side, TradeFill};
use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Polling state machine. All trading state is re-derived from the
/// exchange every cycle; the only thing carried across cycles is the
/// defensive-buy guard, which exists precisely to make "once per open
/// sell" enforceable.
pub struct DecisionEngine {
    config: AppConfig,
    market: Box<dyn MarketData>,
    orders: Box<dyn OrderRepository>,
    /// Order id of the open sell that already got its defensive buy this
    /// episode. Cleared when the book empties.
    defended_sell: Option<u64>,
}

impl DecisionEngine {
    pub fn new(
        config: AppConfig,
        market: Box<dyn MarketData>,
        orders: Box<dyn OrderRepository>,
    ) -> Self {
        Self {
            config,
            market,
            orders,
            defended_sell: None,
        }
    }

    /// Runs the polling loop until too many cycles fail in a row. A
    /// failed cycle is logged and skipped; the next poll re-derives
    /// everything from the exchange, so there is nothing to repair.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Engine loop running. Pair: {}, poll interval: {} ms",
            self.config.symbol, self.config.poll_interval_ms
        );

        let mut consecutive_failures = 0u32;
        loop {
            match self.cycle().await {
                Ok(()) => consecutive_failures = 0,
                Err(e) => {
                    consecutive_failures += 1;
                    error!(
                        "Cycle failed ({}/{}): {}",
                        consecutive_failures, self.config.max_consecutive_failures, e
                    );
                    if consecutive_failures >= self.config.max_consecutive_failures {
                        anyhow::bail!(
                            "{} consecutive cycle failures, last error: {}",
                            consecutive_failures,
                            e
                        );
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
        }
    }

    /// One fetch → decide → act pass.
    pub(crate) async fn cycle(&mut self) -> Result<(), ExchangeError> {
        let open_orders = self.orders.open_orders().await?;

        match open_orders.first() {
            None => {
                self.defended_sell = None;
                self.place_from_history().await
            }
            Some(order) if order.side == Side::Sell => self.defend_open_sell(order).await,
            Some(order) if order.is_unfilled() => {
                let now = Utc::now().timestamp_millis();
                if self
                    .orders
                    .check_and_expire(order, now, self.config.order_lifetime_ms)
                    .await?
                    == OrderFate::Expired
                {
                    info!("Expired buy order canceled, clientOrderId: {}", order.client_order_id);
                }
                Ok(())
            }
            Some(order) => {
                // A partially filled buy is left alone; canceling it would
                // strand a half-executed position.
                debug!(
                    "Buy order {} partially filled ({} of {}), no action",
                    order.client_order_id, order.executed_quantity, order.quantity
                );
                Ok(())
            }
        }
    }

    /// No open orders: alternate sides based on the last executed trade.
    async fn place_from_history(&mut self) -> Result<(), ExchangeError> {
        info!("No open orders. Placing next order.");
        match self.orders.last_trade().await? {
            Some(fill) if fill.side == Side::Sell => self.place_buy().await,
            Some(fill) => self.place_sell(&fill).await,
            None => {
                // Fresh account: nothing realized yet, start accumulating.
                info!("No trade history, bootstrapping with a buy");
                self.place_buy().await
            }
        }
    }

    async fn place_buy(&mut self) -> Result<(), ExchangeError> {
        let avg = self.market.average_price().await?;
        let price = avg * self.config.pricing.buy_coefficient;

        // Четверть свободного баланса котируемой валюты на один вход.
        let free_quote = self.market.free_balance(&self.config.quote_asset).await?;
        let quantity = (free_quote / Decimal::from(4)) / price;

        self.orders.place(Side::Buy, price, quantity).await?;
        info!("Placed buy order - price: {}, quantity: {}", price, quantity);
        Ok(())
    }

    async fn place_sell(&mut self, fill: &TradeFill) -> Result<(), ExchangeError> {
        let avg = self.market.average_price().await?;
        let target = fill.price * self.config.pricing.sell_coefficient;
        // Never sell below the current market average.
        let price = target.max(avg);

        self.orders.place(Side::Sell, price, fill.quantity).await?;
        info!("Placed sell order - price: {}, quantity: {}", price, fill.quantity);
        Ok(())
    }

    /// Open sell sitting above a falling market: place one buy below the
    /// sell price to average down the eventual realized loss. Fires at
    /// most once per open-sell episode.
    async fn defend_open_sell(&mut self, order: &Order) -> Result<(), ExchangeError> {
        if self.defended_sell == Some(order.id) {
            return Ok(());
        }

        let avg = self.market.average_price().await?;
        if order.price * self.config.pricing.drop_threshold >= avg {
            let price = avg * self.config.pricing.market_drop_coefficient;
            self.orders.place(Side::Buy, price, order.quantity).await?;
            self.defended_sell = Some(order.id);
            warn!(
                "⚠️ Market dropped against open sell {} (sell price {}, average {}). \
                 Placed defensive buy - price: {}, quantity: {}",
                order.client_order_id, order.price, avg, price, order.quantity
            );
        }
        Ok(())
    }
}
