use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_USDT_AMOUNT: Decimal = Decimal::TEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Maps a webhook `action` onto an order side. Only `buy` and `sell`
    /// (any casing) are accepted.
    pub fn from_action(action: &str) -> Option<Self> {
        match action.to_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSignal {
    pub side: Side,
    pub symbol: String,
    pub usdt_amount: Decimal,
}

impl ValidatedSignal {
    /// Base asset of a USDT-quoted pair, e.g. `BTC` for `BTCUSDT`.
    pub fn base_asset(&self) -> &str {
        self.symbol.split("USDT").next().unwrap_or(&self.symbol)
    }
}
