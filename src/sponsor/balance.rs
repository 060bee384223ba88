// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account balance lookups in native and token denominations.

use std::sync::Arc;

use tracing::warn;

use super::error::TransferError;
use crate::blockchain::amount::MAX_DECIMALS;
use crate::blockchain::{address, Amount, ChainClient, TokenDescriptor};

/// Balance of one account in one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    /// Normalized account address
    pub address: String,
    pub amount: Amount,
    pub symbol: String,
    /// `None` for the native currency
    pub token: Option<TokenDescriptor>,
}

pub struct AccountBalanceChecker {
    client: Arc<dyn ChainClient>,
}

impl AccountBalanceChecker {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Balance of `address` in the native currency, or in `token` when given.
    ///
    /// Token balance and metadata are read concurrently. Missing metadata
    /// falls back to defaults (18 decimals, `UNKNOWN`), flagged on the
    /// returned descriptor. Decimals beyond what a `U256` can scale are a
    /// contract failure.
    pub async fn balance_of(&self, address: &str, token: Option<&str>) -> Result<Balance, TransferError> {
        let family = self.client.family();
        let address = address::normalize(address, family)?;

        let Some(token) = token else {
            let raw = self.client.native_balance(&address).await?;
            let network = self.client.network();
            return Ok(Balance {
                address,
                amount: Amount::from_raw(raw, network.native_decimals),
                symbol: network.native_symbol.to_string(),
                token: None,
            });
        };

        let contract = address::normalize(token, family)?;
        let (raw, meta) = tokio::join!(
            self.client.token_balance(&address, &contract),
            self.client.token_metadata(&contract)
        );
        let descriptor = TokenDescriptor::from_meta(&contract, &meta?);
        if descriptor.decimals > MAX_DECIMALS {
            return Err(TransferError::ContractCallFailed(format!(
                "token {contract} reports {} decimals, above the supported {MAX_DECIMALS}",
                descriptor.decimals
            )));
        }
        if descriptor.decimals_defaulted {
            warn!(
                chain = %self.client.chain(),
                token = %contract,
                "Token did not report decimals, assuming {}",
                descriptor.decimals
            );
        }

        Ok(Balance {
            address,
            amount: Amount::from_raw(raw?, descriptor.decimals),
            symbol: descriptor.symbol.clone(),
            token: Some(descriptor),
        })
    }
}
