use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ExchangeError;

pub mod bybit_client;
pub mod instruments_response;
pub mod ticker_response;

pub use bybit_client::{BybitClient, BybitConfig};
pub use instruments_response::InstrumentsResult;
pub use ticker_response::TickerResult;

/// Bybit encodes every number as a string.
pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, ExchangeError> {
    Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .map_err(|e| ExchangeError::Malformed(format!("{field} {raw:?}: {e}")))
}
