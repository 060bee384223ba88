// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 / BEP-20 / TRC-20 token contract interactions.
//!
//! The ABI is shared by all three token standards. EVM chains call it
//! through an alloy provider; Tron reuses the same calldata encoding and
//! return decoding over its HTTP API.

use alloy::{
    primitives::{Address, Bytes, U256},
    providers::Provider,
    sol,
    sol_types::SolCall,
};

use super::client::ChainClientError;

// Define the ERC-20 interface using alloy's sol! macro
sol! {
    #[sol(rpc)]
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// Canonical signature of the transfer method, as Tron's API expects it.
pub const TRANSFER_SELECTOR: &str = "transfer(address,uint256)";
pub const BALANCE_OF_SELECTOR: &str = "balanceOf(address)";
pub const DECIMALS_SELECTOR: &str = "decimals()";
pub const SYMBOL_SELECTOR: &str = "symbol()";
pub const NAME_SELECTOR: &str = "name()";

/// ERC-20 contract wrapper.
pub struct Erc20Contract<P> {
    contract: IERC20::IERC20Instance<P>,
}

impl<P: Provider + Clone> Erc20Contract<P> {
    pub fn new(provider: &P, address: Address) -> Self {
        Self {
            contract: IERC20::new(address, provider.clone()),
        }
    }

    /// Get the token name.
    pub async fn name(&self) -> Result<String, ChainClientError> {
        self.contract.name().call().await.map_err(classify_contract_error)
    }

    /// Get the token symbol.
    pub async fn symbol(&self) -> Result<String, ChainClientError> {
        self.contract.symbol().call().await.map_err(classify_contract_error)
    }

    /// Get the token decimals.
    pub async fn decimals(&self) -> Result<u8, ChainClientError> {
        self.contract.decimals().call().await.map_err(classify_contract_error)
    }

    /// Get the raw balance of an address.
    pub async fn balance_of(&self, account: Address) -> Result<U256, ChainClientError> {
        self.contract
            .balanceOf(account)
            .call()
            .await
            .map_err(classify_contract_error)
    }
}

/// Calldata for `transfer(to, amount)`, selector included.
pub fn transfer_calldata(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}

/// ABI-encoded arguments (no selector) for `transfer(to, amount)`.
pub fn transfer_arguments(to: Address, amount: U256) -> Vec<u8> {
    let mut out = Vec::new();
    IERC20::transferCall { to, amount }.abi_encode_raw(&mut out);
    out
}

/// ABI-encoded arguments (no selector) for `balanceOf(account)`.
pub fn balance_of_arguments(account: Address) -> Vec<u8> {
    let mut out = Vec::new();
    IERC20::balanceOfCall { account }.abi_encode_raw(&mut out);
    out
}

pub fn decode_balance(output: &[u8]) -> Result<U256, ChainClientError> {
    IERC20::balanceOfCall::abi_decode_returns(non_empty(output)?).map_err(decode_error)
}

pub fn decode_decimals(output: &[u8]) -> Result<u8, ChainClientError> {
    IERC20::decimalsCall::abi_decode_returns(non_empty(output)?).map_err(decode_error)
}

pub fn decode_string(output: &[u8]) -> Result<String, ChainClientError> {
    IERC20::symbolCall::abi_decode_returns(non_empty(output)?).map_err(decode_error)
}

/// Map a contract call failure onto transport vs. contract errors.
///
/// A JSON-RPC error response means the node executed the call and it
/// reverted; anything else at the transport layer is a reachability problem.
pub fn classify_contract_error(err: alloy::contract::Error) -> ChainClientError {
    match &err {
        alloy::contract::Error::TransportError(transport) if !transport.is_error_resp() => {
            ChainClientError::Rpc(err.to_string())
        }
        _ => ChainClientError::ContractCall(err.to_string()),
    }
}

fn non_empty(output: &[u8]) -> Result<&[u8], ChainClientError> {
    if output.is_empty() {
        Err(ChainClientError::ContractCall(
            "call returned no data (not a token contract?)".to_string(),
        ))
    } else {
        Ok(output)
    }
}

fn decode_error(err: alloy::sol_types::Error) -> ChainClientError {
    ChainClientError::ContractCall(format!("undecodable return data: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn transfer_calldata_starts_with_selector() {
        let to = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let data = transfer_calldata(to, U256::from(1_000_000u64));
        // keccak256("transfer(address,uint256)")[..4]
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[4..], transfer_arguments(to, U256::from(1_000_000u64)).as_slice());
    }

    #[test]
    fn balance_arguments_are_left_padded_address() {
        let account = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let args = balance_of_arguments(account);
        assert_eq!(args.len(), 32);
        assert_eq!(&args[..12], &[0u8; 12]);
        assert_eq!(&args[12..], account.as_slice());
    }

    #[test]
    fn decodes_word_returns() {
        let mut word = [0u8; 32];
        word[31] = 6;
        assert_eq!(decode_decimals(&word).unwrap(), 6);
        assert_eq!(decode_balance(&word).unwrap(), U256::from(6u64));
    }

    #[test]
    fn empty_return_is_contract_error() {
        assert!(matches!(decode_balance(&[]), Err(ChainClientError::ContractCall(_))));
    }
}
