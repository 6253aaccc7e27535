// src/market/mod.rs
use crate::connectors::binance::BinanceClient;
use crate::connectors::messages::{AveragePriceResponse, UserAssetRow};
use crate::error::ExchangeError;
use crate::types::Pair;
use async_trait::async_trait;
use reqwest::Method;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Read-only market queries the engine consumes. Trait so the engine can
/// be tested against a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Short-window average trade price for the configured pair.
    async fn average_price(&self) -> Result<Decimal, ExchangeError>;

    /// Free (unlocked) balance of one asset.
    async fn free_balance(&self, asset: &str) -> Result<Decimal, ExchangeError>;

    /// Quote balance plus base balance valued at the current average
    /// price. Used for sizing and reporting, not for decisions.
    async fn total_balance_in_quote(&self) -> Result<Decimal, ExchangeError>;
}

pub struct BinanceMarketData {
    client: Arc<BinanceClient>,
    pair: Pair,
}

impl BinanceMarketData {
    pub fn new(client: Arc<BinanceClient>, pair: Pair) -> Self {
        Self { client, pair }
    }
}

#[async_trait]
impl MarketData for BinanceMarketData {
    async fn average_price(&self) -> Result<Decimal, ExchangeError> {
        let resp: AveragePriceResponse = self
            .client
            .request(
                Method::GET,
                "/api/v3/avgPrice",
                vec![("symbol", self.pair.symbol.clone())],
                false,
            )
            .await?;
        Ok(resp.price)
    }

    async fn free_balance(&self, asset: &str) -> Result<Decimal, ExchangeError> {
        let rows: Vec<UserAssetRow> = self
            .client
            .request(
                Method::POST,
                "/sapi/v3/asset/getUserAsset",
                vec![("asset", asset.to_string())],
                true,
            )
            .await?;

        // The exchange omits assets the account never held: empty result
        // means a zero balance, not an error.
        Ok(rows
            .into_iter()
            .find(|row| row.asset == asset)
            .map(|row| row.free)
            .unwrap_or(Decimal::ZERO))
    }

    async fn total_balance_in_quote(&self) -> Result<Decimal, ExchangeError> {
        let quote = self.free_balance(&self.pair.quote_asset).await?;
        let base = self.free_balance(&self.pair.base_asset).await?;
        let avg = self.average_price().await?;
        Ok(quote + base * avg)
    }
}
