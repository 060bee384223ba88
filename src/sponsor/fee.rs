// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tracing::debug;

use super::error::TransferError;
use crate::blockchain::{ChainClient, FeeQuote, TransferOperation};

/// Prices operations in the chain's native currency.
///
/// Quotes are computed on every call; gas prices and account resources
/// change between blocks.
pub struct FeeEstimator {
    client: Arc<dyn ChainClient>,
}

impl FeeEstimator {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    pub async fn estimate(&self, op: &TransferOperation) -> Result<FeeQuote, TransferError> {
        let quote = self.client.estimate_fee(op).await?;
        debug!(
            chain = %self.client.chain(),
            from = %op.from,
            units = quote.estimated_units,
            unit_price = %quote.unit_price,
            total = %quote.total_native_cost,
            "Fee quote"
        );
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::{MockCall, MockChainClient};
    use crate::blockchain::{ChainClientError, ChainId};
    use alloy::primitives::U256;

    const FROM: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const TO: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    #[tokio::test]
    async fn every_estimate_queries_the_chain() {
        let mock = Arc::new(MockChainClient::new(ChainId::Bsc));
        mock.push_quote(FeeQuote::fee_market(60_000, 3_000_000_000));
        mock.push_quote(FeeQuote::fee_market(60_000, 5_000_000_000));
        let estimator = FeeEstimator::new(mock.clone());
        let op = TransferOperation::native(FROM, TO, U256::from(1u8));

        let first = estimator.estimate(&op).await.unwrap();
        let second = estimator.estimate(&op).await.unwrap();
        assert_ne!(first.total_native_cost, second.total_native_cost);
        assert_eq!(
            mock.calls()
                .iter()
                .filter(|c| matches!(c, MockCall::EstimateFee(_)))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn simulated_revert_is_a_contract_failure() {
        let mock = Arc::new(MockChainClient::new(ChainId::Bsc));
        mock.fail_estimate(ChainClientError::ContractCall("transfer amount exceeds balance".into()));
        let estimator = FeeEstimator::new(mock);
        let op = TransferOperation::native(FROM, TO, U256::from(1u8));

        assert!(matches!(
            estimator.estimate(&op).await,
            Err(TransferError::ContractCallFailed(_))
        ));
    }
}
