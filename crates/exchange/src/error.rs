use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Exchange rejected request (retCode {code}): {message}")]
    Api { code: i64, message: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Symbol {0} not found in spot market.")]
    SymbolNotFound(String),
    #[error("Request signing failed: {0}")]
    Signing(String),
}

impl ExchangeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SymbolNotFound(_))
    }
}
