use rust_decimal::Decimal;

/// Trading limits of a spot instrument, as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentLimits {
    pub symbol: String,
    /// Minimum order notional in quote currency.
    pub min_order_amt: Decimal,
    pub base_precision: Option<Decimal>,
}
