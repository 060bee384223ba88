// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gas-sponsored transfer orchestration.
//!
//! User accounts hold tokens but usually no native currency to pay fees.
//! A sponsored transfer first tops the account up from an operator account,
//! waits until that top-up is final, and only then signs and broadcasts the
//! user's transfer. The chain-specific work is delegated to a
//! [`ChainClient`](crate::blockchain::ChainClient); everything here is
//! chain-agnostic.

pub mod balance;
pub mod error;
pub mod fee;
pub mod funding;
pub mod journal;
pub mod orchestrator;
pub mod poller;
pub mod types;

pub use balance::{AccountBalanceChecker, Balance};
pub use error::{FailureContext, TransferError};
pub use fee::FeeEstimator;
pub use funding::{FundingAgent, FundingReceipt};
pub use orchestrator::{OrchestratorSettings, TransferOrchestrator};
pub use poller::{ConfirmationPoller, ObservedStatus, PollPolicy, PollResult};
pub use types::{
    FundingPlan, OutcomeStatus, SafetyMultiplier, SubmittedTransfer, TransactionOutcome, TransferRequest,
};
