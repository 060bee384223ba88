// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for BNB Smart Chain, Polygon and Tron.
//!
//! This module provides functionality for:
//! - Address validation and key handling for both chain families
//! - Native and token balance queries
//! - Fee estimation (gas on EVM chains, energy/bandwidth on Tron)
//! - Transaction signing, broadcasting and status tracking

pub mod address;
pub mod amount;
pub mod client;
pub mod erc20;
pub mod evm;
pub mod keys;
pub mod quote;
pub mod tron;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use amount::{Amount, AmountError, AmountView};
pub use client::{ChainClient, ChainClientError, ChainTxStatus, TransferOperation};
pub use evm::EvmChainClient;
pub use keys::{Account, GeneratedWallet};
pub use quote::{FeeDetails, FeeQuote};
pub use tron::TronChainClient;
pub use types::*;
