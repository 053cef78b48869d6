//! HTTP error responses
//!
//! Every failing handler returns an [`ApiError`], rendered as
//! `{ "error", "message", "code"?, "tx_hash"?, "step"? }` with a status code
//! chosen from the underlying failure.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use fibswap_core::{ErrorCode, StepError, SwapError, SwapStep};
use serde::Serialize;

use crate::admin::AdminError;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<SwapStep>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: kind(status),
                message: message.into(),
                code: None,
                tx_hash: None,
                step: None,
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.body.code = Some(code);
        self
    }
}

fn kind(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::CONFLICT => "conflict",
        StatusCode::UNPROCESSABLE_ENTITY => "unprocessable",
        StatusCode::BAD_GATEWAY => "bad_gateway",
        StatusCode::SERVICE_UNAVAILABLE => "service_unavailable",
        StatusCode::GATEWAY_TIMEOUT => "gateway_timeout",
        _ => "internal_error",
    }
}

fn swap_status(err: &SwapError) -> StatusCode {
    match err {
        SwapError::WalletNotConnected => StatusCode::UNAUTHORIZED,
        SwapError::UnknownNetwork { .. }
        | SwapError::SameNetwork { .. }
        | SwapError::UnsupportedToken { .. }
        | SwapError::InvalidAmount { .. }
        | SwapError::InvalidAddress { .. } => StatusCode::BAD_REQUEST,
        SwapError::UnsupportedChain { .. } | SwapError::PoolPaused { .. } => StatusCode::CONFLICT,
        SwapError::AmountAboveLimit { .. } | SwapError::TransactionReverted { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SwapError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        SwapError::Contract(e) => match e.code {
            ErrorCode::ActionRejected => StatusCode::FORBIDDEN,
            ErrorCode::CallException | ErrorCode::InsufficientFunds => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::NetworkError | ErrorCode::UnknownError => StatusCode::BAD_GATEWAY,
        },
    }
}

impl From<SwapError> for ApiError {
    fn from(err: SwapError) -> Self {
        let mut api = ApiError::new(swap_status(&err), err.to_string()).with_code(err.code());
        api.body.tx_hash = err.tx_hash().map(|h| h.to_string());
        api
    }
}

impl From<StepError> for ApiError {
    fn from(err: StepError) -> Self {
        let mut api = ApiError::from(err.source);
        api.body.step = Some(err.step);
        api
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::PoolNotFound(_)
            | AdminError::FeeNotFound(_)
            | AdminError::TransactionNotFound(_) => ApiError::not_found(err.to_string()),
            AdminError::NonPositiveAmount
            | AdminError::FeeOutOfRange { .. }
            | AdminError::InvalidDecimal { .. } => ApiError::bad_request(err.to_string()),
            AdminError::InsufficientBalance { .. } => {
                ApiError::new(StatusCode::CONFLICT, err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
