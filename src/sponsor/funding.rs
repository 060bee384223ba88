// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operator-paid native top-ups ahead of a user transfer.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use tracing::{info, warn};

use super::error::TransferError;
use super::journal::TransferJournal;
use super::poller::{ConfirmationPoller, PollPolicy};
use super::types::{FundingPlan, OutcomeStatus, SafetyMultiplier};
use crate::blockchain::{Account, Amount, ChainClient, FeeQuote, TransferOperation};

/// Result of a completed funding step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingReceipt {
    pub plan: FundingPlan,
    /// `None` when the account's resources already cover the fee
    pub tx_id: Option<String>,
    pub block: Option<u64>,
}

/// Sends native currency from the operator account to a user account and
/// waits until the transfer is final.
pub struct FundingAgent {
    client: Arc<dyn ChainClient>,
    operator: Account,
    multiplier: SafetyMultiplier,
    poller: ConfirmationPoller,
    policy: PollPolicy,
    settle_delay: Duration,
}

impl FundingAgent {
    pub fn new(
        client: Arc<dyn ChainClient>,
        operator: Account,
        multiplier: SafetyMultiplier,
        policy: PollPolicy,
        settle_delay: Duration,
    ) -> Self {
        Self {
            poller: ConfirmationPoller::new(Arc::clone(&client)),
            client,
            operator,
            multiplier,
            policy,
            settle_delay,
        }
    }

    pub fn operator_address(&self) -> &str {
        self.operator.address()
    }

    /// Cover `quote` for `target`, plus the safety margin.
    ///
    /// Returns once the funding transaction is final and the settle delay
    /// has passed. The broadcast transaction id is written to `journal`
    /// before polling starts, and marked final before the settle delay.
    pub async fn fund(
        &self,
        target: &str,
        quote: &FeeQuote,
        journal: &TransferJournal,
    ) -> Result<FundingReceipt, TransferError> {
        let chain = self.client.chain();
        let plan = FundingPlan::new(target, quote, self.multiplier);
        if plan.is_empty() {
            info!(chain = %chain, target, "Account resources cover the transfer, skipping funding");
            return Ok(FundingReceipt {
                plan,
                tx_id: None,
                block: None,
            });
        }

        let not_sent = |reason: String| TransferError::FundingSubmissionFailed {
            reason,
            funding_tx_id: None,
        };

        let op = TransferOperation::native(self.operator.address(), target, plan.native_amount);
        let funding_quote = self
            .client
            .estimate_fee(&op)
            .await
            .map_err(|e| not_sent(format!("could not price funding transfer: {e}")))?;
        let operator_balance = self
            .client
            .native_balance(self.operator.address())
            .await
            .map_err(|e| not_sent(format!("could not read operator balance: {e}")))?;

        let needed = plan.native_amount.saturating_add(funding_quote.total_native_cost);
        if operator_balance < needed {
            return Err(not_sent(format!(
                "operator balance {} is below the {} needed",
                self.native_text(operator_balance),
                self.native_text(needed)
            )));
        }

        let tx_id = self
            .client
            .submit(&self.operator, &op, &funding_quote)
            .await
            .map_err(|e| not_sent(e.to_string()))?;
        journal.record_funding(&tx_id);
        info!(
            chain = %chain,
            funding_tx_id = %tx_id,
            target,
            amount = %self.native_text(plan.native_amount),
            multiplier = %self.multiplier,
            "Funding transaction broadcast"
        );

        let result = self.poller.await_finalization(&tx_id, self.policy).await;
        match result.status {
            OutcomeStatus::Confirmed => {
                journal.record_funding_final(&tx_id, result.block);
                if !self.settle_delay.is_zero() {
                    tokio::time::sleep(self.settle_delay).await;
                }
                Ok(FundingReceipt {
                    plan,
                    tx_id: Some(tx_id),
                    block: result.block,
                })
            }
            OutcomeStatus::Failed => {
                warn!(chain = %chain, funding_tx_id = %tx_id, "Funding transaction failed on-chain");
                Err(TransferError::FundingSubmissionFailed {
                    reason: format!("funding transaction {}", result.last_observed),
                    funding_tx_id: Some(tx_id),
                })
            }
            OutcomeStatus::TimedOut => Err(TransferError::FundingTimedOut {
                funding_tx_id: tx_id,
                attempts: result.attempts,
            }),
        }
    }

    fn native_text(&self, raw: U256) -> String {
        let network = self.client.network();
        format!(
            "{} {}",
            Amount::from_raw(raw, network.native_decimals),
            network.native_symbol
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::{mock_tx_id, MockCall, MockChainClient};
    use crate::blockchain::{ChainClientError, ChainFamily, ChainId, ChainTxStatus};
    use crate::sponsor::journal::FundingStage;

    const TARGET: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn agent(mock: &Arc<MockChainClient>) -> FundingAgent {
        let operator = Account::generate(ChainFamily::FeeMarket);
        mock.set_native_balance(operator.address(), U256::from(10u64).pow(U256::from(18u8)));
        FundingAgent::new(
            mock.clone(),
            operator,
            SafetyMultiplier::DEFAULT,
            PollPolicy {
                max_attempts: 3,
                interval: Duration::ZERO,
            },
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn funds_quote_with_margin_and_waits_for_finality() {
        let mock = Arc::new(MockChainClient::new(ChainId::Bsc));
        let agent = agent(&mock);
        let journal = TransferJournal::default();
        let quote = FeeQuote::fee_market(60_000, 5_000_000_000);

        let receipt = agent.fund(TARGET, &quote, &journal).await.unwrap();
        assert_eq!(receipt.tx_id.as_deref(), Some(mock_tx_id(0).as_str()));
        assert_eq!(receipt.plan.native_amount, U256::from(360_000_000_000_000u64));
        assert_eq!(mock.native_balance_of(TARGET), receipt.plan.native_amount);
        assert_eq!(
            journal.funding(),
            Some(FundingStage::Final {
                tx_id: mock_tx_id(0),
                block: Some(100),
            })
        );
        assert_eq!(mock.status_queries(&mock_tx_id(0)), 1);

        let submitted = mock.submissions();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].from, agent.operator_address());
        assert_eq!(submitted[0].to, TARGET);
    }

    #[tokio::test]
    async fn zero_quote_sends_nothing() {
        let mock = Arc::new(MockChainClient::new(ChainId::Tron));
        let agent = agent(&mock);
        let quote = FeeQuote::resource(30_000, 80_000, 100, 345, 600, 1_000, 0);

        let receipt = agent.fund(TARGET, &quote, &TransferJournal::default()).await.unwrap();
        assert!(receipt.tx_id.is_none());
        assert!(mock.submissions().is_empty());
    }

    #[tokio::test]
    async fn underfunded_operator_is_refused_before_broadcast() {
        let mock = Arc::new(MockChainClient::new(ChainId::Bsc));
        let agent = agent(&mock);
        mock.set_native_balance(agent.operator_address(), U256::from(1u8));

        let err = agent
            .fund(TARGET, &FeeQuote::fee_market(60_000, 5_000_000_000), &TransferJournal::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::FundingSubmissionFailed { funding_tx_id: None, .. }));
        assert!(err.is_retry_safe());
        assert!(!mock.calls().iter().any(|c| matches!(c, MockCall::Submit { .. })));
    }

    #[tokio::test]
    async fn broadcast_error_is_submission_failure() {
        let mock = Arc::new(MockChainClient::new(ChainId::Bsc));
        let agent = agent(&mock);
        mock.fail_submit(0, ChainClientError::Submission("nonce too low".into()));

        let err = agent
            .fund(TARGET, &FeeQuote::fee_market(21_000, 1), &TransferJournal::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::FundingSubmissionFailed { funding_tx_id: None, .. }));
    }

    #[tokio::test]
    async fn unconfirmed_funding_times_out_with_its_id() {
        let mock = Arc::new(MockChainClient::new(ChainId::Bsc));
        let agent = agent(&mock);
        mock.script_status(0, vec![Ok(ChainTxStatus::Pending)]);

        let err = agent
            .fund(TARGET, &FeeQuote::fee_market(21_000, 1), &TransferJournal::default())
            .await
            .unwrap_err();
        match err {
            TransferError::FundingTimedOut {
                funding_tx_id,
                attempts,
            } => {
                assert_eq!(funding_tx_id, mock_tx_id(0));
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn reverted_funding_reports_its_id() {
        let mock = Arc::new(MockChainClient::new(ChainId::Bsc));
        let agent = agent(&mock);
        mock.script_status(
            0,
            vec![Ok(ChainTxStatus::Failed {
                block: Some(5),
                reason: None,
            })],
        );

        let err = agent
            .fund(TARGET, &FeeQuote::fee_market(21_000, 1), &TransferJournal::default())
            .await
            .unwrap_err();
        assert_eq!(err.funding_tx_id(), Some(mock_tx_id(0).as_str()));
        assert!(!err.is_retry_safe());
    }

    #[tokio::test(start_paused = true)]
    async fn settle_delay_follows_finality() {
        let mock = Arc::new(MockChainClient::new(ChainId::Bsc));
        let operator = Account::generate(ChainFamily::FeeMarket);
        mock.set_native_balance(operator.address(), U256::from(10u64).pow(U256::from(18u8)));
        let agent = FundingAgent::new(
            mock.clone(),
            operator,
            SafetyMultiplier::DEFAULT,
            PollPolicy::FEE_MARKET_DEFAULT,
            Duration::from_secs(5),
        );

        let started = tokio::time::Instant::now();
        agent
            .fund(TARGET, &FeeQuote::fee_market(21_000, 1), &TransferJournal::default())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
