// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain client capability shared by every supported network.
//!
//! The transfer orchestrator only talks to [`ChainClient`]. Fee-market (EVM)
//! and resource-model (Tron) chains implement it in [`super::evm`] and
//! [`super::tron`]; the divergence between the two families is carried by
//! [`ChainFamily`] and [`FeeDetails`](super::quote::FeeDetails) rather than by
//! branches in the caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use alloy::primitives::U256;
use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use super::keys::Account;
use super::quote::FeeQuote;
use super::types::{Asset, ChainFamily, ChainId, NetworkConfig, TokenMeta};

/// A value transfer to be estimated or submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOperation {
    /// Sending address (normalized)
    pub from: String,
    /// Receiving address (normalized)
    pub to: String,
    /// Native currency or token contract
    pub asset: Asset,
    /// Raw amount in the asset's smallest unit
    pub amount: U256,
}

impl TransferOperation {
    pub fn native(from: impl Into<String>, to: impl Into<String>, amount: U256) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            asset: Asset::Native,
            amount,
        }
    }

    pub fn token(
        from: impl Into<String>,
        to: impl Into<String>,
        contract: impl Into<String>,
        amount: U256,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            asset: Asset::Token(contract.into()),
            amount,
        }
    }
}

/// Status of a submitted transaction as reported by the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainTxStatus {
    /// Not yet included, or included but not yet final
    Pending,
    /// Finalized and successful
    Confirmed { block: Option<u64> },
    /// Finalized and reverted / failed
    Failed {
        block: Option<u64>,
        reason: Option<String>,
    },
}

/// Capability every supported network provides.
///
/// Implementations must serialize submissions per sending account (see
/// [`SubmissionLocks`]) so concurrent orchestrations sharing the operator
/// account never race on its nonce.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Network served by this client.
    fn network(&self) -> &NetworkConfig;

    fn chain(&self) -> ChainId {
        self.network().chain
    }

    fn family(&self) -> ChainFamily {
        self.chain().family()
    }

    /// Native currency balance in the smallest unit.
    async fn native_balance(&self, address: &str) -> Result<U256, ChainClientError>;

    /// Raw token balance of `address` on `token`.
    async fn token_balance(&self, address: &str, token: &str) -> Result<U256, ChainClientError>;

    /// Token metadata; each field is `None` when the contract cannot report it.
    async fn token_metadata(&self, token: &str) -> Result<TokenMeta, ChainClientError>;

    /// Native-currency cost of executing `op` right now.
    async fn estimate_fee(&self, op: &TransferOperation) -> Result<FeeQuote, ChainClientError>;

    /// Sign `op` with `signer` using the pricing in `quote` and broadcast it.
    ///
    /// Returns the transaction id. Never retried by callers.
    async fn submit(
        &self,
        signer: &Account,
        op: &TransferOperation,
        quote: &FeeQuote,
    ) -> Result<String, ChainClientError>;

    /// Current finalization status of a submitted transaction.
    async fn transaction_status(&self, tx_id: &str) -> Result<ChainTxStatus, ChainClientError>;
}

/// Per-account submission ordering.
///
/// A submission holds the account's guard from nonce/reference lookup until
/// the node has accepted the broadcast. An account's entry lives only while
/// someone holds or waits for it.
#[derive(Debug, Default)]
pub struct SubmissionLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SubmissionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive submission rights on `address`.
    pub async fn acquire(&self, address: &str) -> SubmissionGuard<'_> {
        let key = address.to_ascii_lowercase();
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.clone()).or_default().clone()
        };
        SubmissionGuard {
            locks: self,
            key,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Exclusive submission rights on one account, released on drop.
pub struct SubmissionGuard<'a> {
    locks: &'a SubmissionLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(self.guard.take());
        // Waiters hold a clone; only the map's own reference means idle.
        if locks.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.key);
        }
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainClientError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid transaction id: {0}")]
    InvalidTransactionId(String),

    /// Transport-level failure: the node could not be reached or answered
    /// with a non-success HTTP status.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node answered, but the contract call reverted or returned nothing.
    #[error("Contract error: {0}")]
    ContractCall(String),

    #[error("Transaction submission failed: {0}")]
    Submission(String),

    #[error("Unexpected node response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn submissions_for_one_account_are_serialized() {
        let locks = Arc::new(SubmissionLocks::new());
        let guard = locks.acquire("0xAbC").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("0xabc").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished(), "same account (any case) must wait");

        drop(guard);
        contender.await.expect("contender completes once released");
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn released_accounts_leave_no_entry() {
        let locks = SubmissionLocks::new();
        for n in 0..50 {
            let _guard = locks.acquire(&format!("0x{n:040x}")).await;
            assert_eq!(locks.len(), 1);
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn different_accounts_do_not_block() {
        let locks = SubmissionLocks::new();
        let _a = locks.acquire("0xaaa").await;
        let _b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("0xbbb"))
            .await
            .expect("independent account acquires immediately");
    }
}
