// src/connectors/binance.rs
use crate::connectors::signer;
use crate::error::ExchangeError;
use chrono::Utc;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::debug;

pub const BINANCE_BASE_URL: &str = "https://api.binance.com";

/// Low-level exchange client. Every other component goes through
/// `request`, so timestamping, signing and the API-key header live in
/// exactly one place and cannot drift apart.
pub struct BinanceClient {
    api_key: String,
    secret_key: String,
    recv_window_ms: i64,
    http_client: Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(api_key: String, secret_key: String, recv_window_ms: i64) -> Self {
        Self::with_base_url(api_key, secret_key, recv_window_ms, BINANCE_BASE_URL.to_string())
    }

    /// Base URL is injectable so tests can point the client at a local
    /// mock server.
    pub fn with_base_url(
        api_key: String,
        secret_key: String,
        recv_window_ms: i64,
        base_url: String,
    ) -> Self {
        Self {
            api_key,
            secret_key,
            recv_window_ms,
            http_client: Client::new(),
            base_url,
        }
    }

    /// Connectivity probe, unauthenticated.
    pub async fn ping(&self) -> Result<(), ExchangeError> {
        let url = format!("{}/api/v3/ping", self.base_url);
        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Exchange {
                code: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }

    /// Dispatches one request and parses the JSON body into `T`.
    ///
    /// With `signed` set, recvWindow and a fresh timestamp are appended,
    /// the canonical query is signed, and the signature goes in as the
    /// very last parameter — nothing may be added after it. A non-2xx
    /// status comes back as `ExchangeError::Exchange` with the body text
    /// as the message. The body is consumed on every path so the pooled
    /// connection is released under repeated polling.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: Vec<(&str, String)>,
        signed: bool,
    ) -> Result<T, ExchangeError> {
        let query = if signed {
            let mut params = params;
            params.push(("recvWindow", self.recv_window_ms.to_string()));
            // Свежий timestamp на каждый запрос, иначе вылетим из recvWindow.
            params.push(("timestamp", Utc::now().timestamp_millis().to_string()));

            let canonical = signer::canonical_query(&params);
            let signature = signer::sign(&canonical, &self.secret_key);
            format!("{}&signature={}", canonical, signature)
        } else {
            signer::canonical_query(&params)
        };

        let url = if query.is_empty() {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.base_url, endpoint, query)
        };

        let mut builder = self.http_client.request(method.clone(), &url);
        if signed {
            builder = builder.header("X-MBX-APIKEY", &self.api_key);
        }

        debug!("{} {}", method, endpoint);

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Exchange {
                code: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| ExchangeError::MalformedResponse(format!("{}: {}", endpoint, e)))
    }
}
