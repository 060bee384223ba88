// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! End-to-end transfer flow.
//!
//! A sponsored transfer runs strictly in order:
//!
//! 1. validate the request
//! 2. check the source holds the amount
//! 3. quote the fee
//! 4. fund the source from the operator account and wait for finality
//! 5. re-quote and check the source can now pay
//! 6. sign and broadcast the transfer from the source
//! 7. poll the transfer to finality
//!
//! A direct transfer skips step 4; the source pays its own fee. Nothing is
//! broadcast before step 4, so any failure up to there is retry-safe.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use tracing::{info, warn};
use uuid::Uuid;

use super::balance::AccountBalanceChecker;
use super::error::{FailureContext, TransferError};
use super::fee::FeeEstimator;
use super::funding::FundingAgent;
use super::journal::{FundingStage, TransferJournal};
use super::poller::{ConfirmationPoller, PollPolicy};
use super::types::{OutcomeStatus, SafetyMultiplier, SubmittedTransfer, TransactionOutcome, TransferRequest};
use crate::blockchain::amount::{is_zero_text, validate_format};
use crate::blockchain::{address, Account, Amount, ChainClient, ChainFamily, ChainId, TransferOperation};
use crate::notify::BestEffortNotifier;

/// Tuning for one chain's orchestrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub safety_multiplier: SafetyMultiplier,
    /// Pause after funding finality before the transfer is signed
    pub settle_delay: Duration,
    pub funding_poll: PollPolicy,
    pub transfer_poll: PollPolicy,
    /// Upper bound on one whole orchestration
    pub timeout: Duration,
}

impl OrchestratorSettings {
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn for_family(family: ChainFamily) -> Self {
        let poll = match family {
            ChainFamily::FeeMarket => PollPolicy::FEE_MARKET_DEFAULT,
            ChainFamily::ResourceModel => PollPolicy::RESOURCE_MODEL_DEFAULT,
        };
        Self {
            safety_multiplier: SafetyMultiplier::DEFAULT,
            settle_delay: Self::DEFAULT_SETTLE_DELAY,
            funding_poll: poll,
            transfer_poll: poll,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

struct ValidatedRequest {
    destination: String,
    token: Option<String>,
}

pub struct TransferOrchestrator {
    client: Arc<dyn ChainClient>,
    balances: AccountBalanceChecker,
    fees: FeeEstimator,
    funding: Option<FundingAgent>,
    poller: ConfirmationPoller,
    transfer_poll: PollPolicy,
    timeout: Duration,
    notifier: BestEffortNotifier,
}

impl TransferOrchestrator {
    /// Without an `operator` account only direct transfers are available.
    pub fn new(
        client: Arc<dyn ChainClient>,
        settings: &OrchestratorSettings,
        operator: Option<Account>,
        notifier: BestEffortNotifier,
    ) -> Self {
        let funding = operator.map(|operator| {
            FundingAgent::new(
                Arc::clone(&client),
                operator,
                settings.safety_multiplier,
                settings.funding_poll,
                settings.settle_delay,
            )
        });

        Self {
            balances: AccountBalanceChecker::new(Arc::clone(&client)),
            fees: FeeEstimator::new(Arc::clone(&client)),
            poller: ConfirmationPoller::new(Arc::clone(&client)),
            client,
            funding,
            transfer_poll: settings.transfer_poll,
            timeout: settings.timeout,
            notifier,
        }
    }

    pub fn chain(&self) -> ChainId {
        self.client.chain()
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    pub fn balances(&self) -> &AccountBalanceChecker {
        &self.balances
    }

    pub fn sponsorship_enabled(&self) -> bool {
        self.funding.is_some()
    }

    pub fn operator_address(&self) -> Option<&str> {
        self.funding.as_ref().map(FundingAgent::operator_address)
    }

    /// Transfer with the fee paid by the operator account.
    pub async fn sponsored_transfer(&self, request: TransferRequest) -> Result<TransactionOutcome, TransferError> {
        let Some(funding) = &self.funding else {
            return Err(TransferError::InvalidRequest(format!(
                "gas sponsorship is not configured for {}",
                self.chain()
            )));
        };
        self.execute(request, Some(funding)).await
    }

    /// Transfer with the fee paid by the source account itself.
    pub async fn direct_transfer(&self, request: TransferRequest) -> Result<TransactionOutcome, TransferError> {
        self.execute(request, None).await
    }

    async fn execute(
        &self,
        request: TransferRequest,
        funding: Option<&FundingAgent>,
    ) -> Result<TransactionOutcome, TransferError> {
        let orchestration_id = Uuid::new_v4();
        let chain = self.chain();
        let validated = self.validate(&request)?;

        info!(
            chain = %chain,
            orchestration_id = %orchestration_id,
            from = %request.source.address(),
            to = %validated.destination,
            token = ?validated.token,
            amount = %request.amount,
            sponsored = funding.is_some(),
            "Transfer started"
        );

        let journal = TransferJournal::default();
        let flow = self.run(orchestration_id, &request, &validated, funding, &journal);
        let result = match tokio::time::timeout(self.timeout, flow).await {
            Ok(result) => result,
            Err(_) => Err(self.deadline_exceeded(&journal)),
        };

        match &result {
            Ok(outcome) => {
                info!(
                    chain = %chain,
                    orchestration_id = %orchestration_id,
                    tx_id = %outcome.transaction_id(),
                    funding_tx_id = ?outcome.funding_transaction_id(),
                    block = ?outcome.finalization_block(),
                    "Transfer confirmed"
                );
                self.notifier.dispatch(outcome.clone());
            }
            Err(e) => warn!(
                chain = %chain,
                orchestration_id = %orchestration_id,
                code = e.code(),
                retry_safe = e.is_retry_safe(),
                funding_tx_id = ?e.funding_tx_id(),
                tx_id = ?e.transfer_tx_id(),
                error = %e,
                "Transfer did not complete"
            ),
        }
        result
    }

    fn validate(&self, request: &TransferRequest) -> Result<ValidatedRequest, TransferError> {
        let family = self.client.family();
        if request.source.family() != family {
            return Err(TransferError::InvalidRequest(format!(
                "source account is not a {} account",
                self.chain()
            )));
        }

        validate_format(&request.amount)
            .map_err(|e| TransferError::InvalidRequest(format!("amount: {e}")))?;
        if is_zero_text(&request.amount) {
            return Err(TransferError::InvalidRequest(
                "amount must be greater than zero".to_string(),
            ));
        }

        let destination = address::normalize(&request.destination, family)?;
        let token = request
            .token
            .as_deref()
            .map(|token| address::normalize(token, family))
            .transpose()?;

        Ok(ValidatedRequest { destination, token })
    }

    async fn run(
        &self,
        orchestration_id: Uuid,
        request: &TransferRequest,
        validated: &ValidatedRequest,
        funding: Option<&FundingAgent>,
        journal: &TransferJournal,
    ) -> Result<TransactionOutcome, TransferError> {
        let source = request.source.address();

        let balance = self
            .balances
            .balance_of(source, validated.token.as_deref())
            .await?;
        if let Some(token) = balance.token.as_ref().filter(|t| t.decimals_defaulted) {
            return Err(TransferError::ContractCallFailed(format!(
                "token {} does not report its decimals; refusing to scale amount {}",
                token.contract, request.amount
            )));
        }

        let required = Amount::from_human(&request.amount, balance.amount.decimals())
            .map_err(|e| TransferError::InvalidRequest(format!("amount: {e}")))?;
        if balance.amount.raw() < required.raw() {
            return Err(TransferError::InsufficientTokenBalance {
                symbol: balance.symbol.clone(),
                current_balance: balance.amount.to_human(),
                required_amount: required.to_human(),
            });
        }

        let op = match &validated.token {
            Some(contract) => TransferOperation::token(source, &validated.destination, contract, required.raw()),
            None => TransferOperation::native(source, &validated.destination, required.raw()),
        };
        let quote = self.fees.estimate(&op).await?;

        let (quote, funding_tx_id) = match funding {
            Some(agent) => {
                let receipt = agent.fund(source, &quote, journal).await?;
                // Prices moved while funding settled.
                let fresh = self
                    .fees
                    .estimate(&op)
                    .await
                    .map_err(|e| e.after_funding(receipt.tx_id.as_deref()))?;
                (fresh, receipt.tx_id)
            }
            None => (quote, None),
        };

        let native = self
            .client
            .native_balance(source)
            .await
            .map_err(|e| TransferError::from(e).after_funding(funding_tx_id.as_deref()))?;
        let spent_natively = if op.asset.is_native() { op.amount } else { U256::ZERO };
        let needed = quote.total_native_cost.saturating_add(spent_natively);
        if native < needed {
            let decimals = self.client.network().native_decimals;
            return Err(TransferError::InsufficientNativeForFee {
                current_balance: Amount::from_raw(native, decimals).to_human(),
                required: Amount::from_raw(needed, decimals).to_human(),
                funding_tx_id,
            });
        }

        journal.record_submitting();
        let tx_id = self
            .client
            .submit(&request.source, &op, &quote)
            .await
            .map_err(|e| TransferError::TransferSubmissionFailed {
                reason: e.to_string(),
                funding_tx_id: funding_tx_id.clone(),
                may_be_broadcast: false,
            })?;

        let submitted = SubmittedTransfer {
            orchestration_id,
            chain: self.chain(),
            explorer_url: self.client.network().tx_url(&tx_id),
            transaction_id: tx_id,
            funding_transaction_id: funding_tx_id,
            from: source.to_string(),
            to: validated.destination.clone(),
            amount: required,
            token: balance.token.clone(),
        };
        let context = FailureContext {
            current_balance: balance.amount.to_human(),
            required_amount: required.to_human(),
            last_observed_status: "submitted".to_string(),
        };
        journal.record_transfer(submitted.clone(), context.clone());

        let poll = self
            .poller
            .await_finalization(&submitted.transaction_id, self.transfer_poll)
            .await;
        let outcome = TransactionOutcome::resolve(&submitted, poll.status, poll.block, poll.attempts);
        let context = FailureContext {
            last_observed_status: poll.last_observed.to_string(),
            ..context
        };

        match poll.status {
            OutcomeStatus::Confirmed => Ok(outcome),
            OutcomeStatus::Failed => Err(TransferError::TransferFailed {
                outcome: Box::new(outcome),
                context,
            }),
            OutcomeStatus::TimedOut => Err(TransferError::TransferTimedOut {
                outcome: Box::new(outcome),
                context,
            }),
        }
    }

    /// Classify a flow cut short by the orchestration deadline by how far
    /// its transactions got.
    fn deadline_exceeded(&self, journal: &TransferJournal) -> TransferError {
        if let Some(entry) = journal.transfer() {
            let outcome = TransactionOutcome::resolve(&entry.submitted, OutcomeStatus::TimedOut, None, 0);
            return TransferError::TransferTimedOut {
                outcome: Box::new(outcome),
                context: FailureContext {
                    last_observed_status: "orchestration deadline exceeded".to_string(),
                    ..entry.context
                },
            };
        }

        let deadline = self.timeout.as_secs();
        let funding = journal.funding();
        if journal.submitting() {
            return TransferError::TransferSubmissionFailed {
                reason: format!(
                    "no response to the transfer broadcast within {deadline}s; it may still be on-chain"
                ),
                funding_tx_id: funding.map(|f| f.tx_id().to_string()),
                may_be_broadcast: true,
            };
        }
        match funding {
            Some(FundingStage::Final { tx_id, .. }) => TransferError::TransferSubmissionFailed {
                reason: format!(
                    "deadline of {deadline}s passed after funding was final; the transfer was not sent"
                ),
                funding_tx_id: Some(tx_id),
                may_be_broadcast: false,
            },
            Some(FundingStage::Broadcast { tx_id }) => TransferError::FundingTimedOut {
                funding_tx_id: tx_id,
                attempts: 0,
            },
            None => {
                TransferError::ChainUnreachable(format!("no response within {deadline}s; nothing was broadcast"))
            }
        }
    }
}
