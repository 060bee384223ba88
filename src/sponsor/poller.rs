// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bounded polling for transaction finality.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::types::OutcomeStatus;
use crate::blockchain::{ChainClient, ChainTxStatus};

/// How long and how often to ask the chain about a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub const FEE_MARKET_DEFAULT: Self = Self {
        max_attempts: 40,
        interval: Duration::from_secs(3),
    };

    pub const RESOURCE_MODEL_DEFAULT: Self = Self {
        max_attempts: 20,
        interval: Duration::from_secs(3),
    };

    /// Longest time spent sleeping between attempts.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Last thing the poller learned about a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedStatus {
    Submitted,
    Pending,
    QueryFailed(String),
    Confirmed,
    Failed(Option<String>),
}

impl fmt::Display for ObservedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservedStatus::Submitted => f.write_str("submitted"),
            ObservedStatus::Pending => f.write_str("pending"),
            ObservedStatus::QueryFailed(e) => write!(f, "status query failed: {e}"),
            ObservedStatus::Confirmed => f.write_str("confirmed"),
            ObservedStatus::Failed(Some(reason)) => write!(f, "failed: {reason}"),
            ObservedStatus::Failed(None) => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub tx_id: String,
    pub status: OutcomeStatus,
    pub block: Option<u64>,
    /// Status queries issued
    pub attempts: u32,
    pub last_observed: ObservedStatus,
}

pub struct ConfirmationPoller {
    client: Arc<dyn ChainClient>,
}

impl ConfirmationPoller {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Query `tx_id` until it is final or `policy.max_attempts` is spent.
    ///
    /// Query errors count as pending attempts. A failed transaction stops
    /// polling at once. There is no sleep after the last attempt.
    pub async fn await_finalization(&self, tx_id: &str, policy: PollPolicy) -> PollResult {
        let chain = self.client.chain();
        let mut last_observed = ObservedStatus::Submitted;

        for attempt in 1..=policy.max_attempts {
            match self.client.transaction_status(tx_id).await {
                Ok(ChainTxStatus::Confirmed { block }) => {
                    info!(chain = %chain, tx_id, attempt, block, "Transaction finalized");
                    return PollResult {
                        tx_id: tx_id.to_string(),
                        status: OutcomeStatus::Confirmed,
                        block,
                        attempts: attempt,
                        last_observed: ObservedStatus::Confirmed,
                    };
                }
                Ok(ChainTxStatus::Failed { block, reason }) => {
                    warn!(chain = %chain, tx_id, attempt, block, reason = ?reason, "Transaction failed on-chain");
                    return PollResult {
                        tx_id: tx_id.to_string(),
                        status: OutcomeStatus::Failed,
                        block,
                        attempts: attempt,
                        last_observed: ObservedStatus::Failed(reason),
                    };
                }
                Ok(ChainTxStatus::Pending) => {
                    debug!(chain = %chain, tx_id, attempt, "Transaction pending");
                    last_observed = ObservedStatus::Pending;
                }
                Err(e) => {
                    warn!(chain = %chain, tx_id, attempt, error = %e, "Status query failed");
                    last_observed = ObservedStatus::QueryFailed(e.to_string());
                }
            }

            if attempt < policy.max_attempts && !policy.interval.is_zero() {
                tokio::time::sleep(policy.interval).await;
            }
        }

        warn!(
            chain = %chain,
            tx_id,
            attempts = policy.max_attempts,
            last_observed = %last_observed,
            "Transaction not finalized within polling budget"
        );
        PollResult {
            tx_id: tx_id.to_string(),
            status: OutcomeStatus::TimedOut,
            block: None,
            attempts: policy.max_attempts,
            last_observed,
        }
    }
}
