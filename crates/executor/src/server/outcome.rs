use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::models::Side;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

pub const INVALID_ACTION_MSG: &str = "Invalid action. Only buy and sell are allowed.";
pub const BELOW_MINIMUM_MSG: &str = "Amount is below the minimum order amount";
pub const FORBIDDEN_MSG: &str = "Forbidden";
pub const WEBHOOK_ERROR_MSG: &str = "Internal server error";
pub const LOOKUP_ERROR_MSG: &str = "Server error";

/// Machine-readable class of a request outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Accepted,
    Rejected,
    AuthFailed,
    NotFound,
    InternalError,
}

/// Business-rule refusals. Reported with HTTP 200.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    InvalidAction,
    BelowMinimum { min_order_amount: Decimal },
}

/// The single terminal result of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted { side: Side, order: Value },
    Rejected(Rejection),
    AuthFailed,
    NotFound { symbol: String },
    InternalError { detail: &'static str },
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: &'a str,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    min_order_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<&'a Value>,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Accepted { .. } => OutcomeKind::Accepted,
            Self::Rejected(_) => OutcomeKind::Rejected,
            Self::AuthFailed => OutcomeKind::AuthFailed,
            Self::NotFound { .. } => OutcomeKind::NotFound,
            Self::InternalError { .. } => OutcomeKind::InternalError,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::Accepted { side, .. } => format!("{} order sent", side),
            Self::Rejected(Rejection::InvalidAction) => INVALID_ACTION_MSG.to_string(),
            Self::Rejected(Rejection::BelowMinimum { .. }) => BELOW_MINIMUM_MSG.to_string(),
            Self::AuthFailed => FORBIDDEN_MSG.to_string(),
            Self::NotFound { symbol } => format!("Symbol {} not found in spot market.", symbol),
            Self::InternalError { detail } => detail.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Accepted { .. } | Self::Rejected(_) => StatusCode::OK,
            Self::AuthFailed => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.detail();

        match &self {
            Self::Accepted { order, .. } => (
                status,
                Json(StatusBody {
                    status: &detail,
                    min_order_amount: None,
                    order: Some(order),
                }),
            )
                .into_response(),
            Self::Rejected(rejection) => {
                let min_order_amount = match rejection {
                    Rejection::BelowMinimum { min_order_amount } => Some(*min_order_amount),
                    Rejection::InvalidAction => None,
                };
                (
                    status,
                    Json(StatusBody {
                        status: &detail,
                        min_order_amount,
                        order: None,
                    }),
                )
                    .into_response()
            }
            Self::AuthFailed | Self::NotFound { .. } | Self::InternalError { .. } => {
                (status, Json(ErrorBody { detail })).into_response()
            }
        }
    }
}
