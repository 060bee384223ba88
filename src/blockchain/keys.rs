// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodial account keys.
//!
//! Private keys arrive with each request and live only for its duration.
//! They are never logged: [`Account`]'s `Debug` output redacts the key.

use std::fmt;

use alloy::signers::local::PrivateKeySigner;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::rand_core::OsRng;
use serde::Serialize;
use utoipa::ToSchema;

use super::address;
use super::client::ChainClientError;
use super::types::ChainFamily;

/// A signing account on one chain family.
#[derive(Clone)]
pub struct Account {
    address: String,
    family: ChainFamily,
    key: SigningKey,
}

impl Account {
    /// Load an account from a hex private key (with or without `0x`).
    pub fn from_private_key(private_key: &str, family: ChainFamily) -> Result<Self, ChainClientError> {
        let hex = private_key.trim();
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = alloy::hex::decode(hex)
            .map_err(|_| ChainClientError::InvalidPrivateKey("not valid hex".to_string()))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| ChainClientError::InvalidPrivateKey("not a secp256k1 scalar".to_string()))?;

        Ok(Self::from_signing_key(key, family))
    }

    /// Load an account and check it controls `claimed`.
    ///
    /// Callers may send the source address alongside the key; a mismatch is
    /// rejected rather than silently trusting either value.
    pub fn with_claimed_address(
        private_key: &str,
        claimed: Option<&str>,
        family: ChainFamily,
    ) -> Result<Self, ChainClientError> {
        let account = Self::from_private_key(private_key, family)?;
        if let Some(claimed) = claimed.map(str::trim).filter(|c| !c.is_empty()) {
            let claimed = address::normalize(claimed, family)?;
            if claimed != account.address {
                return Err(ChainClientError::InvalidPrivateKey(format!(
                    "key does not control {claimed}"
                )));
            }
        }
        Ok(account)
    }

    /// Generate a fresh random account.
    pub fn generate(family: ChainFamily) -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng), family)
    }

    fn from_signing_key(key: SigningKey, family: ChainFamily) -> Self {
        let address = address::address_from_public_key(key.verifying_key(), family);
        Self {
            address,
            family,
            key,
        }
    }

    /// Normalized address controlled by this key.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn family(&self) -> ChainFamily {
        self.family
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// Hex private key (`0x`-prefixed), for returning newly created wallets.
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", alloy::hex::encode(self.key.to_bytes()))
    }

    /// Alloy signer for fee-market transactions.
    pub fn evm_signer(&self) -> PrivateKeySigner {
        PrivateKeySigner::from_signing_key(self.key.clone())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("family", &self.family)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Newly created wallet returned to the caller.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedWallet {
    /// Public address
    pub address: String,
    /// Hex private key. Shown exactly once; the service keeps no copy.
    pub private_key: String,
}

impl From<&Account> for GeneratedWallet {
    fn from(account: &Account) -> Self {
        Self {
            address: account.address().to_string(),
            private_key: account.private_key_hex(),
        }
    }
}
