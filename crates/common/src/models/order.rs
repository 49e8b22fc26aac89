use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::Side;

/// Fixed number of decimals an order quantity is rounded to.
pub const QTY_DECIMALS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Spot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderType {
    Market,
}

/// Unit the `qty` of a market order is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarketUnit {
    BaseCoin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub category: Category,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub qty: Decimal,
    pub market_unit: MarketUnit,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, side: Side, qty: Decimal) -> Self {
        Self {
            category: Category::Spot,
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            qty: qty.normalize(),
            market_unit: MarketUnit::BaseCoin,
        }
    }
}

/// `usdt_amount / price` to [`QTY_DECIMALS`] places.
///
/// The division is done on binary doubles and the exact value of the
/// quotient is then rounded half-to-even, so a quotient whose double lies just
/// above or below a decimal midpoint rounds the way the double says
/// (`5 / 2_000_000` gives `0.000003`, `11 / 2_000_000` gives `0.000005`).
/// Returns `None` when either operand has no finite double or the quotient
/// is not finite (zero price) or does not fit a `Decimal`.
pub fn base_quantity(usdt_amount: Decimal, price: Decimal) -> Option<Decimal> {
    let qty = as_f64(usdt_amount)? / as_f64(price)?;
    if !qty.is_finite() {
        return None;
    }
    Decimal::from_f64_retain(qty).map(|exact| {
        exact.round_dp_with_strategy(QTY_DECIMALS, RoundingStrategy::MidpointNearestEven)
    })
}

/// Nearest double to `value`, going through its decimal text.
fn as_f64(value: Decimal) -> Option<f64> {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
