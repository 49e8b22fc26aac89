use std::sync::Arc;

use common::models::{OrderRequest, Side, ValidatedSignal, base_quantity};
use exchange::{ExchangeError, SpotExchange};
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, PartialEq)]
pub enum Dispatch {
    Placed {
        side: Side,
        qty: Decimal,
        order: Value,
    },
    BelowMinimum {
        usdt_amount: Decimal,
        min_order_amount: Decimal,
    },
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error("Non-positive last price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: Decimal },
    #[error("Cannot size {usdt_amount} USDT at price {price}")]
    Arithmetic { usdt_amount: Decimal, price: Decimal },
}

impl DispatchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Exchange(e) if e.is_not_found())
    }
}

/// Sizes accepted signals against live market data and sends one market
/// order per signal. Concurrent signals are not serialized against each other.
pub struct ExecutionService {
    exchange: Arc<dyn SpotExchange>,
}

impl ExecutionService {
    pub fn new(exchange: Arc<dyn SpotExchange>) -> Self {
        Self { exchange }
    }

    pub async fn size_and_dispatch(
        &self,
        signal: &ValidatedSignal,
    ) -> Result<Dispatch, DispatchError> {
        let symbol = signal.symbol.as_str();

        let last_price = self.exchange.last_price(symbol).await?;
        info!("Current price {}: {} USDT", symbol, last_price);
        if last_price <= Decimal::ZERO {
            return Err(DispatchError::InvalidPrice {
                symbol: symbol.to_string(),
                price: last_price,
            });
        }

        let limits = self.exchange.instrument_limits(symbol).await?;
        info!("Minimum order amount: {} USDT", limits.min_order_amt);
        if let Some(precision) = limits.base_precision {
            debug!("Base precision for {}: {}", symbol, precision);
        }

        if signal.usdt_amount < limits.min_order_amt {
            warn!(
                "Amount {} USDT is below the minimum {} USDT",
                signal.usdt_amount, limits.min_order_amt
            );
            return Ok(Dispatch::BelowMinimum {
                usdt_amount: signal.usdt_amount,
                min_order_amount: limits.min_order_amt,
            });
        }

        let qty = base_quantity(signal.usdt_amount, last_price).ok_or(
            DispatchError::Arithmetic {
                usdt_amount: signal.usdt_amount,
                price: last_price,
            },
        )?;
        info!(
            "Computed quantity: {} {} at {} USDT",
            qty,
            signal.base_asset(),
            last_price
        );

        let request = OrderRequest::market(symbol, signal.side, qty);
        info!(
            "Sending order: side={}, qty={}, usdt_amount={}, price={}",
            signal.side, request.qty, signal.usdt_amount, last_price
        );
        let order = self.exchange.place_order(&request).await?;
        info!("{} order sent: {}", signal.side, order);

        Ok(Dispatch::Placed {
            side: signal.side,
            qty,
            order,
        })
    }

    pub async fn min_order_amount(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let limits = self.exchange.instrument_limits(symbol).await?;
        Ok(limits.min_order_amt)
    }
}
