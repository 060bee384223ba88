// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Failure taxonomy of a transfer orchestration.
//!
//! Every error says whether anything irreversible happened on-chain
//! ([`TransferError::is_retry_safe`]). Once a funding or transfer
//! transaction has been broadcast, the error carries its id.

use serde::Serialize;
use utoipa::ToSchema;

use super::types::TransactionOutcome;
use crate::blockchain::ChainClientError;

/// Balances and last known status attached to an on-chain failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailureContext {
    /// Source balance before the transfer, human-scaled
    pub current_balance: String,
    /// Amount that was being transferred, human-scaled
    pub required_amount: String,
    pub last_observed_status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Insufficient {symbol} balance: have {current_balance}, need {required_amount}")]
    InsufficientTokenBalance {
        symbol: String,
        current_balance: String,
        required_amount: String,
    },

    #[error("Insufficient native balance for fees: have {current_balance}, need {required}")]
    InsufficientNativeForFee {
        current_balance: String,
        required: String,
        funding_tx_id: Option<String>,
    },

    #[error("Chain unreachable: {0}")]
    ChainUnreachable(String),

    #[error("Contract call failed: {0}")]
    ContractCallFailed(String),

    #[error("Funding transaction failed: {reason}")]
    FundingSubmissionFailed {
        reason: String,
        funding_tx_id: Option<String>,
    },

    #[error("Funding transaction {funding_tx_id} not finalized after {attempts} status checks")]
    FundingTimedOut { funding_tx_id: String, attempts: u32 },

    #[error("Transfer submission failed: {reason}")]
    TransferSubmissionFailed {
        reason: String,
        funding_tx_id: Option<String>,
        /// The submission was cut short after reaching the node
        may_be_broadcast: bool,
    },

    #[error("Transfer {} failed on-chain", .outcome.transaction_id())]
    TransferFailed {
        outcome: Box<TransactionOutcome>,
        context: FailureContext,
    },

    #[error("Transfer {} not finalized in time", .outcome.transaction_id())]
    TransferTimedOut {
        outcome: Box<TransactionOutcome>,
        context: FailureContext,
    },
}

impl TransferError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidRequest(_) => "INVALID_REQUEST",
            TransferError::InvalidAddress(_) => "INVALID_ADDRESS",
            TransferError::InsufficientTokenBalance { .. } => "INSUFFICIENT_TOKEN_BALANCE",
            TransferError::InsufficientNativeForFee { .. } => "INSUFFICIENT_NATIVE_FOR_FEE",
            TransferError::ChainUnreachable(_) => "CHAIN_UNREACHABLE",
            TransferError::ContractCallFailed(_) => "CONTRACT_CALL_FAILED",
            TransferError::FundingSubmissionFailed { .. } => "FUNDING_SUBMISSION_FAILED",
            TransferError::FundingTimedOut { .. } => "FUNDING_TIMED_OUT",
            TransferError::TransferSubmissionFailed { .. } => "TRANSFER_SUBMISSION_FAILED",
            TransferError::TransferFailed { .. } => "TRANSFER_FAILED",
            TransferError::TransferTimedOut { .. } => "TRANSFER_TIMED_OUT",
        }
    }

    /// True when no transaction was broadcast, so the request can be
    /// repeated without moving funds twice.
    pub fn is_retry_safe(&self) -> bool {
        match self {
            TransferError::InvalidRequest(_)
            | TransferError::InvalidAddress(_)
            | TransferError::InsufficientTokenBalance { .. }
            | TransferError::ChainUnreachable(_)
            | TransferError::ContractCallFailed(_) => true,
            TransferError::InsufficientNativeForFee { funding_tx_id, .. }
            | TransferError::FundingSubmissionFailed { funding_tx_id, .. } => funding_tx_id.is_none(),
            TransferError::TransferSubmissionFailed {
                funding_tx_id,
                may_be_broadcast,
                ..
            } => funding_tx_id.is_none() && !may_be_broadcast,
            TransferError::FundingTimedOut { .. }
            | TransferError::TransferFailed { .. }
            | TransferError::TransferTimedOut { .. } => false,
        }
    }

    /// Caller-side problem (bad input or balances), as opposed to a chain
    /// or submission failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidRequest(_)
                | TransferError::InvalidAddress(_)
                | TransferError::InsufficientTokenBalance { .. }
                | TransferError::InsufficientNativeForFee { .. }
                | TransferError::ContractCallFailed(_)
        )
    }

    pub fn funding_tx_id(&self) -> Option<&str> {
        match self {
            TransferError::InsufficientNativeForFee { funding_tx_id, .. }
            | TransferError::FundingSubmissionFailed { funding_tx_id, .. }
            | TransferError::TransferSubmissionFailed { funding_tx_id, .. } => funding_tx_id.as_deref(),
            TransferError::FundingTimedOut { funding_tx_id, .. } => Some(funding_tx_id),
            TransferError::TransferFailed { outcome, .. }
            | TransferError::TransferTimedOut { outcome, .. } => outcome.funding_transaction_id(),
            _ => None,
        }
    }

    pub fn transfer_tx_id(&self) -> Option<&str> {
        match self {
            TransferError::TransferFailed { outcome, .. }
            | TransferError::TransferTimedOut { outcome, .. } => Some(outcome.transaction_id()),
            _ => None,
        }
    }

    /// Attach the funding transaction id to a failure that happened after
    /// funding was broadcast.
    pub(crate) fn after_funding(self, funding_tx_id: Option<&str>) -> Self {
        match (funding_tx_id, self) {
            (Some(_), err @ TransferError::InsufficientNativeForFee { .. })
            | (Some(_), err @ TransferError::TransferSubmissionFailed { .. }) => err,
            (Some(id), err) => TransferError::TransferSubmissionFailed {
                reason: err.to_string(),
                funding_tx_id: Some(id.to_string()),
                may_be_broadcast: false,
            },
            (None, err) => err,
        }
    }
}

/// Read-path mapping; submissions are mapped explicitly by their callers.
impl From<ChainClientError> for TransferError {
    fn from(err: ChainClientError) -> Self {
        match err {
            ChainClientError::InvalidAddress(msg) => TransferError::InvalidAddress(msg),
            ChainClientError::InvalidPrivateKey(msg) | ChainClientError::InvalidTransactionId(msg) => {
                TransferError::InvalidRequest(msg)
            }
            ChainClientError::ContractCall(msg) => TransferError::ContractCallFailed(msg),
            ChainClientError::InvalidRpcUrl(_)
            | ChainClientError::Rpc(_)
            | ChainClientError::Submission(_)
            | ChainClientError::InvalidResponse(_) => TransferError::ChainUnreachable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_failures_are_retry_safe() {
        let errors = [
            TransferError::InvalidRequest("x".into()),
            TransferError::InsufficientTokenBalance {
                symbol: "USDT".into(),
                current_balance: "50".into(),
                required_amount: "100".into(),
            },
            TransferError::ChainUnreachable("down".into()),
            TransferError::FundingSubmissionFailed {
                reason: "rejected".into(),
                funding_tx_id: None,
            },
        ];
        for err in errors {
            assert!(err.is_retry_safe(), "{} should be retry-safe", err.code());
        }
    }

    #[test]
    fn broadcast_failures_are_not_retry_safe() {
        let funded = TransferError::TransferSubmissionFailed {
            reason: "nonce too low".into(),
            funding_tx_id: Some("0xf1".into()),
            may_be_broadcast: false,
        };
        assert!(!funded.is_retry_safe());
        assert_eq!(funded.funding_tx_id(), Some("0xf1"));

        let interrupted = TransferError::TransferSubmissionFailed {
            reason: "deadline".into(),
            funding_tx_id: None,
            may_be_broadcast: true,
        };
        assert!(!interrupted.is_retry_safe());

        let timed_out = TransferError::FundingTimedOut {
            funding_tx_id: "0xf2".into(),
            attempts: 40,
        };
        assert!(!timed_out.is_retry_safe());
        assert_eq!(timed_out.funding_tx_id(), Some("0xf2"));
    }

    #[test]
    fn chain_errors_map_by_kind() {
        assert!(matches!(
            TransferError::from(ChainClientError::Rpc("timeout".into())),
            TransferError::ChainUnreachable(_)
        ));
        assert!(matches!(
            TransferError::from(ChainClientError::ContractCall("revert".into())),
            TransferError::ContractCallFailed(_)
        ));
        assert!(matches!(
            TransferError::from(ChainClientError::InvalidAddress("0x1".into())),
            TransferError::InvalidAddress(_)
        ));
    }

    #[test]
    fn failures_after_funding_carry_the_funding_id() {
        let err = TransferError::ChainUnreachable("down".into()).after_funding(Some("0xf1"));
        assert!(matches!(
            &err,
            TransferError::TransferSubmissionFailed { funding_tx_id: Some(id), .. } if id == "0xf1"
        ));

        let untouched = TransferError::ChainUnreachable("down".into()).after_funding(None);
        assert!(matches!(untouched, TransferError::ChainUnreachable(_)));
    }
}
