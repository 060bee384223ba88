// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Decimal precision assumed when a token contract does not report one.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Symbol reported when a token contract does not expose one.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// Supported networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    /// BNB Smart Chain (BEP-20 tokens)
    Bsc,
    /// Polygon PoS
    Polygon,
    /// Tron (TRC-20 tokens)
    Tron,
}

impl ChainId {
    pub const ALL: [ChainId; 3] = [ChainId::Bsc, ChainId::Polygon, ChainId::Tron];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Bsc => "bsc",
            ChainId::Polygon => "polygon",
            ChainId::Tron => "tron",
        }
    }

    /// Fee model family of this chain.
    pub fn family(&self) -> ChainFamily {
        match self {
            ChainId::Bsc | ChainId::Polygon => ChainFamily::FeeMarket,
            ChainId::Tron => ChainFamily::ResourceModel,
        }
    }

    /// `mode` value that turns a `/transfer` request into a native
    /// currency transfer. Tron transfers are always token transfers.
    pub fn native_transfer_mode(&self) -> Option<&'static str> {
        match self {
            ChainId::Bsc => Some("BNP"),
            ChainId::Polygon => Some("MATIC"),
            ChainId::Tron => None,
        }
    }

    /// Display name used in responses ("BSC", "Polygon", "Tron").
    pub fn display_name(&self) -> &'static str {
        match self {
            ChainId::Bsc => "BSC",
            ChainId::Polygon => "Polygon",
            ChainId::Tron => "Tron",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainId {
    type Err = String;

    /// Accepts the route aliases used by the HTTP API (`Bep20`, `trc20`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bsc" | "bep20" | "bnb" => Ok(ChainId::Bsc),
            "polygon" | "matic" => Ok(ChainId::Polygon),
            "tron" | "trc20" | "trx" => Ok(ChainId::Tron),
            other => Err(format!("Unsupported chain `{other}`")),
        }
    }
}

/// How a chain charges for transaction execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChainFamily {
    /// Sender pays `gas price × gas used` in the native currency (EVM).
    FeeMarket,
    /// Execution draws from staked energy/bandwidth; any shortfall is burned
    /// from the native balance (Tron).
    ResourceModel,
}

/// Network endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Which network this is
    pub chain: ChainId,
    /// Network name for display
    pub name: String,
    /// EVM chain id (0 for Tron)
    pub chain_id: u64,
    /// RPC / full-node HTTP endpoint
    pub rpc_url: String,
    /// Endpoint serving finalized (solidified) state, where the chain has one
    pub solidity_url: Option<String>,
    /// Block explorer prefix for transaction links
    pub explorer_tx_url: String,
    /// Native currency symbol
    pub native_symbol: &'static str,
    /// Native currency precision
    pub native_decimals: u8,
}

impl NetworkConfig {
    pub fn bsc_mainnet(rpc_url: impl Into<String>) -> Self {
        Self {
            chain: ChainId::Bsc,
            name: "BNB Smart Chain".to_string(),
            chain_id: 56,
            rpc_url: rpc_url.into(),
            solidity_url: None,
            explorer_tx_url: "https://bscscan.com/tx".to_string(),
            native_symbol: "BNB",
            native_decimals: 18,
        }
    }

    pub fn polygon_mainnet(rpc_url: impl Into<String>) -> Self {
        Self {
            chain: ChainId::Polygon,
            name: "Polygon PoS".to_string(),
            chain_id: 137,
            rpc_url: rpc_url.into(),
            solidity_url: None,
            explorer_tx_url: "https://polygonscan.com/tx".to_string(),
            native_symbol: "MATIC",
            native_decimals: 18,
        }
    }

    pub fn tron_mainnet(api_url: impl Into<String>, solidity_url: impl Into<String>) -> Self {
        Self {
            chain: ChainId::Tron,
            name: "Tron Mainnet".to_string(),
            chain_id: 0,
            rpc_url: api_url.into(),
            solidity_url: Some(solidity_url.into()),
            explorer_tx_url: "https://tronscan.org/#/transaction".to_string(),
            native_symbol: "TRX",
            native_decimals: 6,
        }
    }

    /// Explorer link for a transaction id.
    pub fn tx_url(&self, tx_id: &str) -> String {
        format!("{}/{}", self.explorer_tx_url, tx_id)
    }
}

/// Token metadata as reported by the token contract.
///
/// Each field is read independently; a missing field falls back to a default
/// and the fallback is recorded so callers never mistake it for real data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMeta {
    pub decimals: Option<u8>,
    pub symbol: Option<String>,
    pub name: Option<String>,
}

/// A token resolved for a specific request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    /// Normalized contract address
    pub contract: String,
    /// Token symbol, `UNKNOWN` if the contract does not report one
    pub symbol: String,
    /// Decimal precision
    pub decimals: u8,
    /// True when `decimals` is the 18 fallback rather than a value read on-chain
    pub decimals_defaulted: bool,
}

impl TokenDescriptor {
    /// Build a descriptor from independently-read metadata, applying fallbacks.
    pub fn from_meta(contract: impl Into<String>, meta: &TokenMeta) -> Self {
        Self {
            contract: contract.into(),
            symbol: meta
                .symbol
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
            decimals: meta.decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS),
            decimals_defaulted: meta.decimals.is_none(),
        }
    }
}

/// The asset moved by an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    /// The chain's native currency (BNB, MATIC, TRX)
    Native,
    /// A token contract (normalized address)
    Token(String),
}

impl Asset {
    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    pub fn contract(&self) -> Option<&str> {
        match self {
            Asset::Native => None,
            Asset::Token(contract) => Some(contract),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_aliases_resolve() {
        assert_eq!("Bep20".parse::<ChainId>().unwrap(), ChainId::Bsc);
        assert_eq!("bsc".parse::<ChainId>().unwrap(), ChainId::Bsc);
        assert_eq!("POLYGON".parse::<ChainId>().unwrap(), ChainId::Polygon);
        assert_eq!("trc20".parse::<ChainId>().unwrap(), ChainId::Tron);
        assert!("solana".parse::<ChainId>().is_err());
    }

    #[test]
    fn families_match_fee_models() {
        assert_eq!(ChainId::Bsc.family(), ChainFamily::FeeMarket);
        assert_eq!(ChainId::Polygon.family(), ChainFamily::FeeMarket);
        assert_eq!(ChainId::Tron.family(), ChainFamily::ResourceModel);
    }

    #[test]
    fn descriptor_surfaces_decimal_fallback() {
        let meta = TokenMeta {
            decimals: None,
            symbol: None,
            name: None,
        };
        let token = TokenDescriptor::from_meta("0xabc", &meta);
        assert_eq!(token.decimals, DEFAULT_TOKEN_DECIMALS);
        assert!(token.decimals_defaulted);
        assert_eq!(token.symbol, UNKNOWN_SYMBOL);

        let meta = TokenMeta {
            decimals: Some(6),
            symbol: Some("USDT".into()),
            name: Some("Tether USD".into()),
        };
        let token = TokenDescriptor::from_meta("0xabc", &meta);
        assert_eq!(token.decimals, 6);
        assert!(!token.decimals_defaulted);
        assert_eq!(token.symbol, "USDT");
    }

    #[test]
    fn explorer_links_per_chain() {
        let bsc = NetworkConfig::bsc_mainnet("http://localhost:8545");
        assert_eq!(bsc.tx_url("0x01"), "https://bscscan.com/tx/0x01");

        let tron = NetworkConfig::tron_mainnet("http://a", "http://b");
        assert_eq!(tron.tx_url("ab"), "https://tronscan.org/#/transaction/ab");
    }
}
