// src/error.rs
use crate::types::Side;
use thiserror::Error;

/// Everything that can go wrong talking to the exchange. All variants are
/// recoverable at cycle level: the engine logs and waits for the next poll.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Network / DNS / timeout, anything below HTTP semantics.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The exchange answered with a non-2xx status.
    #[error("exchange returned {code}: {message}")]
    Exchange { code: u16, message: String },

    /// Computed order size came out non-positive. The order is refused
    /// locally instead of letting the exchange reject a malformed request.
    #[error("refusing to place {side} order with zero quantity")]
    ZeroQuantity { side: Side },

    /// 2xx response whose body does not parse into the expected shape.
    #[error("malformed exchange response: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quantity_names_the_side() {
        let err = ExchangeError::ZeroQuantity { side: Side::Sell };
        assert_eq!(
            err.to_string(),
            "refusing to place SELL order with zero quantity"
        );
    }

    #[test]
    fn exchange_error_carries_status_and_body() {
        let err = ExchangeError::Exchange {
            code: 418,
            message: "IP banned".to_string(),
        };
        assert!(err.to_string().contains("418"));
        assert!(err.to_string().contains("IP banned"));
    }
}
