use common::models::InstrumentLimits;
use serde::Deserialize;

use crate::{error::ExchangeError, remote::parse_decimal, traits::RemoteResponse};

#[derive(Debug, Deserialize)]
pub struct InstrumentsResult {
    pub list: Vec<InstrumentEntry>,
}

#[derive(Debug, Deserialize)]
pub struct InstrumentEntry {
    pub symbol: String,
    #[serde(rename(deserialize = "lotSizeFilter"))]
    pub lot_size_filter: LotSizeFilter,
}

#[derive(Debug, Deserialize)]
pub struct LotSizeFilter {
    #[serde(rename(deserialize = "minOrderAmt"))]
    pub min_order_amt: String,
    #[serde(rename(deserialize = "basePrecision"), default)]
    pub base_precision: Option<String>,
}

impl RemoteResponse<InstrumentLimits> for InstrumentsResult {
    fn to_model(&self, symbol: &str) -> Result<InstrumentLimits, ExchangeError> {
        let entry = self
            .list
            .first()
            .ok_or_else(|| ExchangeError::SymbolNotFound(symbol.to_string()))?;
        let filter = &entry.lot_size_filter;

        Ok(InstrumentLimits {
            symbol: entry.symbol.clone(),
            min_order_amt: parse_decimal("minOrderAmt", &filter.min_order_amt)?,
            base_precision: filter
                .base_precision
                .as_deref()
                .map(|p| parse_decimal("basePrecision", p))
                .transpose()?,
        })
    }
}
