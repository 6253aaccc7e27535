// src/config.rs

use crate::types::Pair;
use config::{Config, ConfigError, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Pricing knobs. All injectable so tests can pin exact values instead of
/// fighting compiled-in constants.
#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    /// Buy discount against the average price (e.g. 0.998).
    #[serde(default = "default_buy_coefficient")]
    pub buy_coefficient: Decimal,
    /// Sell premium over the last fill price (e.g. 1.004).
    #[serde(default = "default_sell_coefficient")]
    pub sell_coefficient: Decimal,
    /// sell price × this >= average price triggers the defensive buy.
    #[serde(default = "default_drop_threshold")]
    pub drop_threshold: Decimal,
    /// Defensive buy goes in at average price × this.
    #[serde(default = "default_market_drop_coefficient")]
    pub market_drop_coefficient: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            buy_coefficient: default_buy_coefficient(),
            sell_coefficient: default_sell_coefficient(),
            drop_threshold: default_drop_threshold(),
            market_drop_coefficient: default_market_drop_coefficient(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub secret_key: String,
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,

    /// Server-side clock-skew tolerance attached to signed requests.
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: i64,
    /// Unfilled buy orders older than this get canceled.
    #[serde(default = "default_order_lifetime_ms")]
    pub order_lifetime_ms: i64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// This many failed cycles in a row abort the loop to the outer
    /// recovery wrapper.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Initial restart cooldown; doubles per restart up to the cap.
    #[serde(default = "default_restart_cooldown_ms")]
    pub restart_cooldown_ms: u64,
    #[serde(default = "default_max_restart_cooldown_ms")]
    pub max_restart_cooldown_ms: u64,

    #[serde(default)]
    pub pricing: PricingConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("Settings"))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn pair(&self) -> Pair {
        Pair {
            symbol: self.symbol.clone(),
            base_asset: self.base_asset.clone(),
            quote_asset: self.quote_asset.clone(),
        }
    }
}

fn default_buy_coefficient() -> Decimal {
    Decimal::new(998, 3) // 0.998
}

fn default_sell_coefficient() -> Decimal {
    Decimal::new(1004, 3) // 1.004
}

fn default_drop_threshold() -> Decimal {
    Decimal::new(94, 2) // 0.94
}

fn default_market_drop_coefficient() -> Decimal {
    Decimal::new(101, 2) // 1.01
}

fn default_recv_window_ms() -> i64 {
    60_000
}

fn default_order_lifetime_ms() -> i64 {
    60_000
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_restart_cooldown_ms() -> u64 {
    10_000
}

fn default_max_restart_cooldown_ms() -> u64 {
    300_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_defaults_match_the_deployed_strategy() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.buy_coefficient.to_string(), "0.998");
        assert_eq!(pricing.sell_coefficient.to_string(), "1.004");
        assert_eq!(pricing.drop_threshold.to_string(), "0.94");
        assert_eq!(pricing.market_drop_coefficient.to_string(), "1.01");
    }
}
