// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Address validation and normalization per chain family.
//!
//! - Fee-market chains: `0x` + 40 hex characters. Mixed-case input must carry
//!   a valid EIP-55 checksum; the normalized form is always checksummed.
//! - Resource-model chain (Tron): base58check over `0x41 || 20-byte account`,
//!   `T`-prefixed. The 42-character `41…` hex form is also accepted and
//!   normalized to base58.

use std::str::FromStr;

use alloy::primitives::{keccak256, Address};
use k256::ecdsa::VerifyingKey;
use sha2::{Digest, Sha256};

use super::client::ChainClientError;
use super::types::ChainFamily;

/// Version byte prefixed to every Tron mainnet account.
pub const TRON_ADDRESS_PREFIX: u8 = 0x41;

const TRON_ADDRESS_LEN: usize = 21;
const CHECKSUM_LEN: usize = 4;

/// True when `address` is a well-formed address on a chain of `family`.
pub fn is_valid(address: &str, family: ChainFamily) -> bool {
    normalize(address, family).is_ok()
}

/// Validate `address` and return its canonical text form.
pub fn normalize(address: &str, family: ChainFamily) -> Result<String, ChainClientError> {
    match family {
        ChainFamily::FeeMarket => parse_evm(address).map(|a| a.to_checksum(None)),
        ChainFamily::ResourceModel => parse_tron(address).map(|a| tron_base58(&a)),
    }
}

/// Parse an EVM address, enforcing the checksum on mixed-case input.
pub fn parse_evm(address: &str) -> Result<Address, ChainClientError> {
    let address = address.trim();
    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| invalid(address, "must start with 0x"))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(address, "expected 40 hex characters"));
    }

    let mixed_case = hex.chars().any(|c| c.is_ascii_uppercase())
        && hex.chars().any(|c| c.is_ascii_lowercase());
    if mixed_case {
        Address::parse_checksummed(address, None).map_err(|_| invalid(address, "bad checksum"))
    } else {
        Address::from_str(address).map_err(|e| invalid(address, &e.to_string()))
    }
}

/// Parse a Tron address to its 20-byte account part.
pub fn parse_tron(address: &str) -> Result<Address, ChainClientError> {
    let address = address.trim();
    let hex = address.strip_prefix("0x").unwrap_or(address);

    let bytes = if hex.len() == TRON_ADDRESS_LEN * 2 && hex.chars().all(|c| c.is_ascii_hexdigit())
    {
        alloy::hex::decode(hex).map_err(|e| invalid(address, &e.to_string()))?
    } else {
        decode_base58check(address)?
    };

    if bytes.len() != TRON_ADDRESS_LEN || bytes[0] != TRON_ADDRESS_PREFIX {
        return Err(invalid(address, "not a Tron mainnet address"));
    }
    Ok(Address::from_slice(&bytes[1..]))
}

/// Base58check form (`T…`) of a 20-byte Tron account.
pub fn tron_base58(account: &Address) -> String {
    let mut payload = Vec::with_capacity(TRON_ADDRESS_LEN + CHECKSUM_LEN);
    payload.push(TRON_ADDRESS_PREFIX);
    payload.extend_from_slice(account.as_slice());
    let checksum = double_sha256(&payload);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    bs58::encode(payload).into_string()
}

/// `41…` hex form of a 20-byte Tron account.
pub fn tron_hex(account: &Address) -> String {
    format!("41{}", alloy::hex::encode(account.as_slice()))
}

/// 20-byte account derived from a secp256k1 public key.
///
/// Both families use `keccak256(uncompressed_pubkey[1..])[12..]`; they only
/// differ in how the bytes are rendered.
pub fn account_from_public_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Canonical address text for a public key on a chain of `family`.
pub fn address_from_public_key(key: &VerifyingKey, family: ChainFamily) -> String {
    let account = account_from_public_key(key);
    match family {
        ChainFamily::FeeMarket => account.to_checksum(None),
        ChainFamily::ResourceModel => tron_base58(&account),
    }
}

fn decode_base58check(address: &str) -> Result<Vec<u8>, ChainClientError> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| invalid(address, &e.to_string()))?;
    if decoded.len() != TRON_ADDRESS_LEN + CHECKSUM_LEN {
        return Err(invalid(address, "unexpected length"));
    }

    let (payload, checksum) = decoded.split_at(TRON_ADDRESS_LEN);
    if double_sha256(payload)[..CHECKSUM_LEN] != *checksum {
        return Err(invalid(address, "bad checksum"));
    }
    Ok(payload.to_vec())
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

fn invalid(address: &str, reason: &str) -> ChainClientError {
    ChainClientError::InvalidAddress(format!("{address}: {reason}"))
}
