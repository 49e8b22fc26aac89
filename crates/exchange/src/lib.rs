pub mod error;
pub mod remote;
pub mod traits;

pub use error::ExchangeError;
pub use remote::{BybitClient, BybitConfig};
#[cfg(feature = "mock")]
pub use traits::MockSpotExchange;
pub use traits::SpotExchange;
