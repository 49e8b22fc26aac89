use std::str::FromStr;

use common::models::{DEFAULT_SYMBOL, DEFAULT_USDT_AMOUNT, Side, ValidatedSignal};
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

const REDACTED: &str = "***";
/// Finest scale a `Decimal` carries.
const MAX_SCALE: u32 = 28;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Unauthorized signal")]
    Unauthorized,
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    #[error("Field {field} has unusable value {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("usdt_amount is not a positive number: {0}")]
    InvalidAmount(String),
    #[error("Signal payload is not a JSON object")]
    NotAnObject,
}

/// Authenticates and normalizes raw webhook payloads.
pub struct SignalValidator {
    webhook_secret: String,
}

impl SignalValidator {
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    pub fn validate(&self, payload: &Value) -> Result<ValidatedSignal, ValidationError> {
        let fields = payload.as_object().ok_or(ValidationError::NotAnObject)?;

        let secret = fields.get("secret").and_then(Value::as_str);
        if secret != Some(self.webhook_secret.as_str()) {
            warn!("Unauthorized access attempt.");
            return Err(ValidationError::Unauthorized);
        }

        let action = match fields.get("action") {
            Some(Value::String(action)) => action.to_lowercase(),
            None | Some(Value::Null) => "<missing>".to_string(),
            Some(other) => other.to_string(),
        };
        let Some(side) = Side::from_action(&action) else {
            warn!("Invalid action: {}", action);
            return Err(ValidationError::InvalidAction(action));
        };

        let symbol = match fields.get("symbol") {
            None | Some(Value::Null) => DEFAULT_SYMBOL.to_string(),
            Some(Value::String(symbol)) => symbol.clone(),
            Some(other) => {
                return Err(ValidationError::InvalidField {
                    field: "symbol",
                    value: other.to_string(),
                });
            }
        };

        let usdt_amount = match fields.get("usdt_amount") {
            None | Some(Value::Null) => DEFAULT_USDT_AMOUNT,
            Some(raw) => coerce_amount(raw)?,
        };

        Ok(ValidatedSignal {
            side,
            symbol,
            usdt_amount,
        })
    }
}

/// Accepts JSON numbers and numeric strings, including exponent notation.
///
/// Positivity is decided on the parsed double. Amounts finer than
/// [`MAX_SCALE`] places are kept as the smallest positive `Decimal`, so they
/// still reach the minimum-amount check instead of failing here.
fn coerce_amount(raw: &Value) -> Result<Decimal, ValidationError> {
    let invalid = || ValidationError::InvalidAmount(raw.to_string());

    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(invalid()),
    };
    let value = text.parse::<f64>().map_err(|_| invalid())?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid());
    }

    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .or_else(|| Decimal::from_f64_retain(value).map(|d| d.round_dp(MAX_SCALE)))
        .ok_or_else(invalid)?;

    Ok(amount.max(Decimal::new(1, MAX_SCALE)))
}

/// Copy of `payload` that is safe to write to the audit log.
pub fn redact_secret(payload: &Value) -> Value {
    let mut redacted = payload.clone();
    if let Some(secret) = redacted.get_mut("secret") {
        *secret = Value::String(REDACTED.to_string());
    }
    redacted
}
