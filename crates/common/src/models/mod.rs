pub mod instrument;
pub mod order;
pub mod signal;

pub use instrument::InstrumentLimits;
pub use order::{Category, MarketUnit, OrderRequest, OrderType, QTY_DECIMALS, base_quantity};
pub use signal::{DEFAULT_SYMBOL, DEFAULT_USDT_AMOUNT, Side, ValidatedSignal};
