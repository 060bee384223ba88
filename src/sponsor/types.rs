// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Requests, plans and outcomes of a transfer orchestration.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::blockchain::amount::{format_amount, parse_amount};
use crate::blockchain::{Account, Amount, AmountView, ChainId, FeeQuote, TokenDescriptor};

/// A request to move an asset out of a custodial account.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Account the asset leaves from; it signs the transfer
    pub source: Account,
    /// Token contract, `None` for the native currency
    pub token: Option<String>,
    pub destination: String,
    /// Human-scaled amount, e.g. `"12.5"`
    pub amount: String,
}

/// Final state of a submitted transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Confirmed,
    Failed,
    TimedOut,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutcomeStatus::Confirmed => "confirmed",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::TimedOut => "timed_out",
        })
    }
}

/// A transfer that has been broadcast but not yet resolved.
#[derive(Debug, Clone)]
pub struct SubmittedTransfer {
    pub orchestration_id: Uuid,
    pub chain: ChainId,
    pub transaction_id: String,
    pub funding_transaction_id: Option<String>,
    pub from: String,
    pub to: String,
    pub amount: Amount,
    pub token: Option<TokenDescriptor>,
    pub explorer_url: String,
}

/// Result of a transfer once the confirmation poller has resolved it.
///
/// Built once from a [`SubmittedTransfer`] and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutcome {
    orchestration_id: Uuid,
    chain: ChainId,
    status: OutcomeStatus,
    transaction_id: String,
    funding_transaction_id: Option<String>,
    finalization_block: Option<u64>,
    from: String,
    to: String,
    amount: AmountView,
    token: Option<TokenDescriptor>,
    /// Status queries issued before resolution
    attempts: u32,
    explorer_url: String,
    completed_at: DateTime<Utc>,
}

impl TransactionOutcome {
    pub fn resolve(
        submitted: &SubmittedTransfer,
        status: OutcomeStatus,
        finalization_block: Option<u64>,
        attempts: u32,
    ) -> Self {
        Self {
            orchestration_id: submitted.orchestration_id,
            chain: submitted.chain,
            status,
            transaction_id: submitted.transaction_id.clone(),
            funding_transaction_id: submitted.funding_transaction_id.clone(),
            finalization_block,
            from: submitted.from.clone(),
            to: submitted.to.clone(),
            amount: submitted.amount.into(),
            token: submitted.token.clone(),
            attempts,
            explorer_url: submitted.explorer_url.clone(),
            completed_at: Utc::now(),
        }
    }

    pub fn orchestration_id(&self) -> Uuid {
        self.orchestration_id
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn funding_transaction_id(&self) -> Option<&str> {
        self.funding_transaction_id.as_deref()
    }

    pub fn finalization_block(&self) -> Option<u64> {
        self.finalization_block
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> &AmountView {
        &self.amount
    }

    pub fn token(&self) -> Option<&TokenDescriptor> {
        self.token.as_ref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn explorer_url(&self) -> &str {
        &self.explorer_url
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

const BASIS_POINTS: u32 = 10_000;

/// Factor applied to a fee quote when funding, held in basis points.
///
/// Always at least 1.0 so a plan never covers less than the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyMultiplier {
    basis_points: u32,
}

impl SafetyMultiplier {
    /// 1.2: a 20% margin over the quoted cost.
    pub const DEFAULT: Self = Self {
        basis_points: 12_000,
    };

    pub fn from_basis_points(basis_points: u32) -> Option<Self> {
        (basis_points >= BASIS_POINTS).then_some(Self { basis_points })
    }

    pub fn basis_points(&self) -> u32 {
        self.basis_points
    }

    /// `cost × multiplier`, rounded up.
    pub fn apply(&self, cost: U256) -> U256 {
        let scale = U256::from(BASIS_POINTS);
        let scaled = cost.saturating_mul(U256::from(self.basis_points));
        let quotient = scaled / scale;
        if (scaled % scale).is_zero() {
            quotient
        } else {
            quotient + U256::from(1u8)
        }
    }
}

impl Default for SafetyMultiplier {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for SafetyMultiplier {
    type Err = String;

    /// Parses decimal text with up to four places (`"1.2"`, `"1.0525"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let basis_points = parse_amount(s, 4).map_err(|e| format!("invalid multiplier `{s}`: {e}"))?;
        let basis_points = u32::try_from(basis_points)
            .map_err(|_| format!("multiplier `{s}` is too large"))?;
        Self::from_basis_points(basis_points)
            .ok_or_else(|| format!("multiplier `{s}` must be at least 1"))
    }
}

impl fmt::Display for SafetyMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(U256::from(self.basis_points), 4))
    }
}

/// Native currency the operator sends ahead of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingPlan {
    pub target: String,
    pub quoted_cost: U256,
    pub native_amount: U256,
}

impl FundingPlan {
    pub fn new(target: impl Into<String>, quote: &FeeQuote, multiplier: SafetyMultiplier) -> Self {
        Self {
            target: target.into(),
            quoted_cost: quote.total_native_cost,
            native_amount: multiplier.apply(quote.total_native_cost),
        }
    }

    /// Resources already cover the operation.
    pub fn is_empty(&self) -> bool {
        self.native_amount.is_zero()
    }
}
