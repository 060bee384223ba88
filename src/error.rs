// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::blockchain::ChainClientError;
use crate::sponsor::{TransactionOutcome, TransferError};

/// Diagnostics attached to transfer failures.
#[derive(Debug, Default, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_observed_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TransactionOutcome>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
    /// Whether repeating the request cannot move funds twice
    pub retry_safe: bool,
    pub details: ErrorDetails,
}

/// Error response body.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Always `false`
    success: bool,
    error: String,
    code: String,
    retry_safe: bool,
    #[serde(flatten)]
    details: ErrorDetails,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            retry_safe: true,
            details: ErrorDetails::default(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message)
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let mut details = ErrorDetails {
            funding_transaction_id: err.funding_tx_id().map(str::to_string),
            transaction_id: err.transfer_tx_id().map(str::to_string),
            ..ErrorDetails::default()
        };
        match &err {
            TransferError::InsufficientTokenBalance {
                symbol,
                current_balance,
                required_amount,
            } => {
                details.symbol = Some(symbol.clone());
                details.current_balance = Some(current_balance.clone());
                details.required_amount = Some(required_amount.clone());
            }
            TransferError::InsufficientNativeForFee {
                current_balance,
                required,
                ..
            } => {
                details.current_balance = Some(current_balance.clone());
                details.required_amount = Some(required.clone());
            }
            TransferError::FundingTimedOut { attempts, .. } => details.attempts = Some(*attempts),
            TransferError::TransferFailed { outcome, context }
            | TransferError::TransferTimedOut { outcome, context } => {
                details.current_balance = Some(context.current_balance.clone());
                details.required_amount = Some(context.required_amount.clone());
                details.last_observed_status = Some(context.last_observed_status.clone());
                details.attempts = Some(outcome.attempts());
                details.outcome = Some(outcome.as_ref().clone());
            }
            _ => {}
        }

        Self {
            status,
            message: err.to_string(),
            code: err.code(),
            retry_safe: err.is_retry_safe(),
            details,
        }
    }
}

/// Read-only chain failures outside a transfer (balances, metadata).
impl From<ChainClientError> for ApiError {
    fn from(err: ChainClientError) -> Self {
        TransferError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            error: self.message,
            code: self.code.to_string(),
            retry_safe: self.retry_safe,
            details: self.details,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.code, "INVALID_REQUEST");

        let off = ApiError::service_unavailable("off");
        assert_eq!(off.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(
            body,
            r#"{"success":false,"error":"bad data","code":"INVALID_REQUEST","retrySafe":true}"#
        );
    }

    #[tokio::test]
    async fn insufficient_balance_is_a_client_error_with_amounts() {
        let (status, body) = body_json(
            TransferError::InsufficientTokenBalance {
                symbol: "USDT".into(),
                current_balance: "50".into(),
                required_amount: "100".into(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INSUFFICIENT_TOKEN_BALANCE");
        assert_eq!(body["currentBalance"], "50");
        assert_eq!(body["requiredAmount"], "100");
        assert_eq!(body["retrySafe"], true);
    }

    #[tokio::test]
    async fn post_funding_failure_is_a_server_error_with_funding_id() {
        let (status, body) = body_json(
            TransferError::TransferSubmissionFailed {
                reason: "nonce too low".into(),
                funding_tx_id: Some("0xf1".into()),
                may_be_broadcast: false,
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["fundingTransactionId"], "0xf1");
        assert_eq!(body["retrySafe"], false);
        assert!(body.get("transactionId").is_none());
    }

    #[tokio::test]
    async fn unreachable_chain_is_a_server_error() {
        let (status, body) = body_json(ChainClientError::Rpc("connection refused".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "CHAIN_UNREACHABLE");
    }
}
