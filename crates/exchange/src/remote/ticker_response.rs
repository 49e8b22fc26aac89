use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{error::ExchangeError, remote::parse_decimal, traits::RemoteResponse};

#[derive(Debug, Deserialize)]
pub struct TickerResult {
    pub list: Vec<TickerEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TickerEntry {
    #[serde(rename(deserialize = "lastPrice"))]
    pub last_price: String,
}

impl RemoteResponse<Decimal> for TickerResult {
    fn to_model(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let entry = self
            .list
            .first()
            .ok_or_else(|| ExchangeError::Malformed(format!("empty ticker list for {symbol}")))?;
        parse_decimal("lastPrice", &entry.last_price)
    }
}
