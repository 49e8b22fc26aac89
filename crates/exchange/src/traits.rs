use async_trait::async_trait;
use common::models::{InstrumentLimits, OrderRequest};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::ExchangeError;

/// Spot market operations the order flow depends on.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait SpotExchange: Send + Sync {
    /// Last traded price of `symbol`.
    async fn last_price(&self, symbol: &str) -> Result<Decimal, ExchangeError>;

    /// Lot size limits of `symbol`. Fails with [`ExchangeError::SymbolNotFound`]
    /// when the exchange does not list it.
    async fn instrument_limits(&self, symbol: &str) -> Result<InstrumentLimits, ExchangeError>;

    /// Submits `order` once and hands back the exchange response untouched.
    async fn place_order(&self, order: &OrderRequest) -> Result<Value, ExchangeError>;
}

/// Conversion from a decoded `result` payload into a domain value.
pub trait RemoteResponse<T> {
    fn to_model(&self, symbol: &str) -> Result<T, ExchangeError>;
}
