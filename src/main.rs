// src/main.rs
use crate::config::AppConfig;
use crate::connectors::binance::BinanceClient;
use crate::core::engine::DecisionEngine;
use crate::market::BinanceMarketData;
use crate::orders::BinanceOrderRepository;
use crate::utils::backoff::RestartBackoff;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod connectors;
mod core;
mod error;
mod market;
mod orders;
mod types;
mod utils;

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "pairbot.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guard = init_tracing();

    let config = AppConfig::new()?;
    info!("🚀 pairbot starting. Pair: {}", config.symbol);

    let client = Arc::new(BinanceClient::new(
        config.api_key.clone(),
        config.secret_key.clone(),
        config.recv_window_ms,
    ));

    // Fail fast on broken connectivity before entering the loop.
    client.ping().await?;

    let pair = config.pair();
    let market = BinanceMarketData::new(client.clone(), pair.clone());
    let orders = BinanceOrderRepository::new(client, pair);

    let mut engine = DecisionEngine::new(config.clone(), Box::new(market), Box::new(orders));

    // Outer recovery wrapper: a bounded loop with backoff, never a
    // recursive restart. The engine only returns after a run of failed
    // cycles, so every pass here means the exchange was unreachable.
    let mut backoff = RestartBackoff::new(
        Duration::from_millis(config.restart_cooldown_ms),
        Duration::from_millis(config.max_restart_cooldown_ms),
        0.1,
    );

    loop {
        let started = Instant::now();
        let Err(e) = engine.run().await else {
            break;
        };

        if started.elapsed() > Duration::from_millis(config.max_restart_cooldown_ms) {
            backoff.reset();
        }

        let delay = backoff.next_delay();
        error!(
            "Engine stopped: {}. Restarting in {:?} (attempt {})",
            e,
            delay,
            backoff.attempt()
        );
        tokio::time::sleep(delay).await;
    }

    Ok(())
}
