use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
    server::{
        AppState,
        outcome::{LOOKUP_ERROR_MSG, Outcome, Rejection, WEBHOOK_ERROR_MSG},
    },
    services::{
        execution_service::Dispatch,
        signal_validator::{ValidationError, redact_secret},
    },
};

#[derive(Debug, Deserialize)]
pub struct MinOrderQuery {
    pub symbol: String,
}

#[derive(Debug, Serialize)]
pub struct MinOrderResponse {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_order_amount: Decimal,
}

pub async fn root() -> Json<Value> {
    Json(json!({ "status": "test" }))
}

pub async fn head_root() -> StatusCode {
    StatusCode::OK
}

pub async fn min_order(
    State(state): State<AppState>,
    query: Result<Query<MinOrderQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(MinOrderQuery { symbol })) = query else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "Query parameter 'symbol' is required" })),
        )
            .into_response();
    };

    let lookup = state.execution.min_order_amount(&symbol).await;
    match lookup {
        Ok(min_order_amount) => Json(MinOrderResponse {
            symbol,
            min_order_amount,
        })
        .into_response(),
        Err(e) if e.is_not_found() => {
            warn!("{}", e);
            Outcome::NotFound { symbol }.into_response()
        }
        Err(e) => {
            error!("min_order lookup for {} failed: {}", symbol, e);
            Outcome::InternalError {
                detail: LOOKUP_ERROR_MSG,
            }
            .into_response()
        }
    }
}

pub async fn webhook(State(state): State<AppState>, body: Bytes) -> Outcome {
    let span = info_span!("signal", signal_id = %Uuid::new_v4());

    let outcome = process_signal(&state, &body).instrument(span.clone()).await;
    span.in_scope(|| info!(kind = ?outcome.kind(), "{}", outcome.detail()));

    outcome
}

async fn process_signal(state: &AppState, body: &[u8]) -> Outcome {
    let internal_error = Outcome::InternalError {
        detail: WEBHOOK_ERROR_MSG,
    };

    let payload: Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Unreadable signal body: {}", e);
            return internal_error;
        }
    };
    info!("Received signal: {}", redact_secret(&payload));

    let signal = match state.validator.validate(&payload) {
        Ok(signal) => signal,
        Err(ValidationError::Unauthorized) => return Outcome::AuthFailed,
        Err(ValidationError::InvalidAction(_)) => {
            return Outcome::Rejected(Rejection::InvalidAction);
        }
        Err(e) => {
            error!("Signal unusable: {}", e);
            return internal_error;
        }
    };

    let dispatch = state.execution.size_and_dispatch(&signal).await;
    match dispatch {
        Ok(Dispatch::Placed { side, qty, order }) => {
            debug!("Order accepted: {} {} {}", side, qty, signal.symbol);
            Outcome::Accepted { side, order }
        }
        Ok(Dispatch::BelowMinimum {
            usdt_amount,
            min_order_amount,
        }) => {
            debug!(
                "Signal for {} USDT refused, minimum is {} USDT",
                usdt_amount, min_order_amount
            );
            Outcome::Rejected(Rejection::BelowMinimum { min_order_amount })
        }
        Err(e) if e.is_not_found() => {
            error!("{}", e);
            Outcome::NotFound {
                symbol: signal.symbol,
            }
        }
        Err(e) => {
            error!("Order flow for {} failed: {}", signal.symbol, e);
            internal_error
        }
    }
}
