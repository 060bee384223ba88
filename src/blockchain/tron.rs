// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resource-model chain client (Tron) over the full-node HTTP API.
//!
//! Execution on Tron draws energy (contract calls) and bandwidth (transaction
//! bytes) from the sender's staked and free pools. Only the shortfall is
//! burned from the TRX balance, so a fee quote depends on the account as much
//! as on the operation.
//!
//! Finality is read from the solidity node, which only reports transactions
//! that are irreversible.

use std::collections::HashMap;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::address;
use super::client::{ChainClient, ChainClientError, ChainTxStatus, SubmissionLocks, TransferOperation};
use super::erc20;
use super::keys::Account;
use super::quote::FeeQuote;
use super::types::{Asset, ChainFamily, NetworkConfig, TokenMeta};

/// Bytes of bandwidth consumed by a TRC-20 `transfer` transaction.
pub const TRC20_TRANSFER_BANDWIDTH: u64 = 345;

/// Bytes of bandwidth consumed by a plain TRX transfer.
pub const TRX_TRANSFER_BANDWIDTH: u64 = 270;

/// Upper bound on TRX burned by a single contract call (100 TRX).
pub const DEFAULT_FEE_LIMIT_SUN: u64 = 100_000_000;

const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the Tron network.
pub struct TronChainClient {
    network: NetworkConfig,
    http: Client,
    api_url: String,
    solidity_url: String,
    /// Maximum sun a token transfer may burn for energy
    fee_limit_sun: u64,
    locks: SubmissionLocks,
}

/// Energy and bandwidth pools of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountResources {
    pub free_net_limit: u64,
    pub free_net_used: u64,
    pub net_limit: u64,
    pub net_used: u64,
    pub energy_limit: u64,
    pub energy_used: u64,
}

impl AccountResources {
    /// Bandwidth one transaction can draw without burning TRX.
    ///
    /// A transaction is paid from a single pool, staked first then free,
    /// so the usable amount is the larger remainder rather than the sum.
    pub fn available_bandwidth(&self) -> u64 {
        let staked = self.net_limit.saturating_sub(self.net_used);
        let free = self.free_net_limit.saturating_sub(self.free_net_used);
        staked.max(free)
    }

    pub fn available_energy(&self) -> u64 {
        self.energy_limit.saturating_sub(self.energy_used)
    }
}

/// Network-wide resource prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParameters {
    /// Sun per unit of energy
    pub energy_fee: u64,
    /// Sun per byte of bandwidth
    pub transaction_fee: u64,
    /// Sun burned when a transfer activates a new account
    pub create_account_fee: u64,
    /// Additional sun burned by the system contract on activation
    pub create_new_account_fee: u64,
}

struct ConstantCall {
    output: Vec<u8>,
    energy_used: u64,
}

impl TronChainClient {
    pub fn new(
        network: NetworkConfig,
        api_key: Option<&str>,
        fee_limit_sun: u64,
    ) -> Result<Self, ChainClientError> {
        if network.chain.family() != ChainFamily::ResourceModel {
            return Err(ChainClientError::InvalidRpcUrl(format!(
                "{} is not a resource-model chain",
                network.chain
            )));
        }
        url::Url::parse(&network.rpc_url)
            .map_err(|e| ChainClientError::InvalidRpcUrl(e.to_string()))?;

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            let value = HeaderValue::from_str(key.trim()).map_err(|_| {
                ChainClientError::InvalidRpcUrl("API key is not a valid header value".to_string())
            })?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| ChainClientError::Rpc(format!("failed to build HTTP client: {e}")))?;

        let api_url = network.rpc_url.trim_end_matches('/').to_string();
        let solidity_url = network
            .solidity_url
            .as_deref()
            .unwrap_or(&network.rpc_url)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            network,
            http,
            api_url,
            solidity_url,
            fee_limit_sun,
            locks: SubmissionLocks::new(),
        })
    }

    async fn post_json(&self, base: &str, path: &str, payload: &Value) -> Result<Value, ChainClientError> {
        let response = self
            .http
            .post(format!("{base}{path}"))
            .json(payload)
            .send()
            .await
            .map_err(|e| ChainClientError::Rpc(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChainClientError::Rpc(format!("POST {path} returned {status}: {body}")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ChainClientError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))?;

        // The node reports malformed input as 200 + {"Error": "..."}.
        if let Some(error) = value.get("Error").and_then(Value::as_str) {
            return Err(ChainClientError::InvalidResponse(format!("POST {path}: {error}")));
        }
        Ok(value)
    }

    async fn account(&self, address: &str) -> Result<Value, ChainClientError> {
        self.post_json(
            &self.api_url,
            "/wallet/getaccount",
            &json!({ "address": address, "visible": true }),
        )
        .await
    }

    async fn account_exists(&self, address: &str) -> Result<bool, ChainClientError> {
        let account = self.account(address).await?;
        Ok(account.as_object().is_some_and(|o| !o.is_empty()))
    }

    async fn account_resources(&self, address: &str) -> Result<AccountResources, ChainClientError> {
        let value = self
            .post_json(
                &self.api_url,
                "/wallet/getaccountresource",
                &json!({ "address": address, "visible": true }),
            )
            .await?;
        Ok(parse_account_resources(&value))
    }

    async fn chain_parameters(&self) -> Result<ChainParameters, ChainClientError> {
        let value = self
            .post_json(&self.api_url, "/wallet/getchainparameters", &json!({}))
            .await?;
        parse_chain_parameters(&value)
    }

    /// Execute a contract method without broadcasting.
    async fn constant_call(
        &self,
        owner: &str,
        contract: &str,
        selector: &str,
        arguments: &[u8],
    ) -> Result<ConstantCall, ChainClientError> {
        let value = self
            .post_json(
                &self.api_url,
                "/wallet/triggerconstantcontract",
                &json!({
                    "owner_address": owner,
                    "contract_address": contract,
                    "function_selector": selector,
                    "parameter": alloy::hex::encode(arguments),
                    "visible": true,
                }),
            )
            .await?;
        parse_constant_call(&value)
    }

    /// Read-only call from the zero account.
    async fn view_call(&self, contract: &str, selector: &str) -> Result<Vec<u8>, ChainClientError> {
        let caller = address::tron_base58(&Address::ZERO);
        Ok(self.constant_call(&caller, contract, selector, &[]).await?.output)
    }

    /// Ask the node to build an unsigned transaction for `op`.
    async fn create_transaction(&self, op: &TransferOperation) -> Result<Value, ChainClientError> {
        match &op.asset {
            Asset::Native => {
                let amount = u64::try_from(op.amount).map_err(|_| {
                    ChainClientError::Submission("amount exceeds the TRX range".to_string())
                })?;
                self.post_json(
                    &self.api_url,
                    "/wallet/createtransaction",
                    &json!({
                        "owner_address": op.from,
                        "to_address": op.to,
                        "amount": amount,
                        "visible": true,
                    }),
                )
                .await
            }
            Asset::Token(contract) => {
                let to = address::parse_tron(&op.to)?;
                let value = self
                    .post_json(
                        &self.api_url,
                        "/wallet/triggersmartcontract",
                        &json!({
                            "owner_address": op.from,
                            "contract_address": contract,
                            "function_selector": erc20::TRANSFER_SELECTOR,
                            "parameter": alloy::hex::encode(erc20::transfer_arguments(to, op.amount)),
                            "fee_limit": self.fee_limit_sun,
                            "call_value": 0,
                            "visible": true,
                        }),
                    )
                    .await?;

                if !value.pointer("/result/result").and_then(Value::as_bool).unwrap_or(false) {
                    let reason = value
                        .get("result")
                        .and_then(decode_message)
                        .unwrap_or_else(|| "node refused to build the transfer".to_string());
                    return Err(ChainClientError::Submission(reason));
                }
                value
                    .get("transaction")
                    .cloned()
                    .ok_or_else(|| ChainClientError::InvalidResponse("no transaction in response".to_string()))
            }
        }
    }

    async fn broadcast(&self, transaction: &Value) -> Result<(), ChainClientError> {
        let value = self
            .post_json(&self.api_url, "/wallet/broadcasttransaction", transaction)
            .await?;

        if value.get("result").and_then(Value::as_bool) == Some(true) {
            return Ok(());
        }
        let code = value.get("code").and_then(Value::as_str).unwrap_or("UNKNOWN");
        let message = decode_message(&value).unwrap_or_default();
        Err(ChainClientError::Submission(format!("{code}: {message}")))
    }
}

#[async_trait]
impl ChainClient for TronChainClient {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    async fn native_balance(&self, address: &str) -> Result<U256, ChainClientError> {
        let account = self.account(address).await?;
        // Unactivated accounts come back as `{}`.
        Ok(U256::from(account.get("balance").and_then(Value::as_u64).unwrap_or(0)))
    }

    async fn token_balance(&self, address: &str, token: &str) -> Result<U256, ChainClientError> {
        let holder = address::parse_tron(address)?;
        let call = self
            .constant_call(
                address,
                token,
                erc20::BALANCE_OF_SELECTOR,
                &erc20::balance_of_arguments(holder),
            )
            .await?;
        erc20::decode_balance(&call.output)
    }

    async fn token_metadata(&self, token: &str) -> Result<TokenMeta, ChainClientError> {
        address::parse_tron(token)?;
        let (decimals, symbol, name) = tokio::join!(
            self.view_call(token, erc20::DECIMALS_SELECTOR),
            self.view_call(token, erc20::SYMBOL_SELECTOR),
            self.view_call(token, erc20::NAME_SELECTOR),
        );

        let decimals = decimals.and_then(|out| erc20::decode_decimals(&out));
        if let Err(e) = &decimals {
            debug!(chain = %self.network.chain, token, error = %e, "decimals() unavailable");
        }
        Ok(TokenMeta {
            decimals: decimals.ok(),
            symbol: symbol.and_then(|out| erc20::decode_string(&out)).ok(),
            name: name.and_then(|out| erc20::decode_string(&out)).ok(),
        })
    }

    async fn estimate_fee(&self, op: &TransferOperation) -> Result<FeeQuote, ChainClientError> {
        let (energy_required, bandwidth_bytes, activates_recipient) = match &op.asset {
            Asset::Token(contract) => {
                let to = address::parse_tron(&op.to)?;
                let call = self
                    .constant_call(
                        &op.from,
                        contract,
                        erc20::TRANSFER_SELECTOR,
                        &erc20::transfer_arguments(to, op.amount),
                    )
                    .await?;
                (call.energy_used, TRC20_TRANSFER_BANDWIDTH, false)
            }
            Asset::Native => (0, TRX_TRANSFER_BANDWIDTH, !self.account_exists(&op.to).await?),
        };

        let (resources, params) =
            tokio::try_join!(self.account_resources(&op.from), self.chain_parameters())?;

        let activation_fee = if activates_recipient {
            params.create_account_fee + params.create_new_account_fee
        } else {
            0
        };

        debug!(
            chain = %self.network.chain,
            from = %op.from,
            energy_required,
            energy_available = resources.available_energy(),
            bandwidth_available = resources.available_bandwidth(),
            activation_fee,
            "Estimated resource cost"
        );

        Ok(FeeQuote::resource(
            energy_required,
            resources.available_energy(),
            params.energy_fee,
            bandwidth_bytes,
            resources.available_bandwidth(),
            params.transaction_fee,
            activation_fee,
        ))
    }

    async fn submit(
        &self,
        signer: &Account,
        op: &TransferOperation,
        _quote: &FeeQuote,
    ) -> Result<String, ChainClientError> {
        if signer.address() != op.from {
            return Err(ChainClientError::InvalidPrivateKey(format!(
                "signer {} cannot send from {}",
                signer.address(),
                op.from
            )));
        }

        let _guard = self.locks.acquire(&op.from).await;
        let transaction = self.create_transaction(op).await?;
        verify_transaction_parties(&transaction, op)?;
        let (tx_id, signed) = sign_transaction(signer, transaction)?;
        self.broadcast(&signed).await?;

        info!(
            chain = %self.network.chain,
            tx_id = %tx_id,
            from = %op.from,
            to = %op.to,
            "Transaction broadcast"
        );
        Ok(tx_id)
    }

    async fn transaction_status(&self, tx_id: &str) -> Result<ChainTxStatus, ChainClientError> {
        if tx_id.len() != 64 || !tx_id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ChainClientError::InvalidTransactionId(tx_id.to_string()));
        }
        let value = self
            .post_json(
                &self.solidity_url,
                "/walletsolidity/gettransactioninfobyid",
                &json!({ "value": tx_id }),
            )
            .await?;
        Ok(parse_transaction_info(&value))
    }
}

fn field_u64(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0)
}

/// Zero-valued fields are omitted by the node, so absence reads as 0.
fn parse_account_resources(value: &Value) -> AccountResources {
    AccountResources {
        free_net_limit: field_u64(value, "freeNetLimit"),
        free_net_used: field_u64(value, "freeNetUsed"),
        net_limit: field_u64(value, "NetLimit"),
        net_used: field_u64(value, "NetUsed"),
        energy_limit: field_u64(value, "EnergyLimit"),
        energy_used: field_u64(value, "EnergyUsed"),
    }
}

fn parse_chain_parameters(value: &Value) -> Result<ChainParameters, ChainClientError> {
    let params: HashMap<&str, u64> = value
        .get("chainParameter")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let key = entry.get("key").and_then(Value::as_str)?;
                    Some((key, field_u64(entry, "value")))
                })
                .collect()
        })
        .unwrap_or_default();

    let required = |key: &str| {
        params
            .get(key)
            .copied()
            .filter(|v| *v > 0)
            .ok_or_else(|| ChainClientError::InvalidResponse(format!("chain parameter {key} missing")))
    };

    Ok(ChainParameters {
        energy_fee: required("getEnergyFee")?,
        transaction_fee: required("getTransactionFee")?,
        create_account_fee: params.get("getCreateAccountFee").copied().unwrap_or(0),
        create_new_account_fee: params
            .get("getCreateNewAccountFeeInSystemContract")
            .copied()
            .unwrap_or(0),
    })
}

fn parse_constant_call(value: &Value) -> Result<ConstantCall, ChainClientError> {
    let accepted = value.pointer("/result/result").and_then(Value::as_bool).unwrap_or(false);
    let reverted = value.pointer("/transaction/ret/0/ret").and_then(Value::as_str) == Some("FAILED");
    if !accepted || reverted {
        let reason = value
            .get("result")
            .and_then(decode_message)
            .unwrap_or_else(|| "contract call reverted".to_string());
        return Err(ChainClientError::ContractCall(reason));
    }

    let output = match value.pointer("/constant_result/0").and_then(Value::as_str) {
        Some(hex) => alloy::hex::decode(hex)
            .map_err(|e| ChainClientError::InvalidResponse(format!("constant_result: {e}")))?,
        None => Vec::new(),
    };

    Ok(ConstantCall {
        output,
        energy_used: field_u64(value, "energy_used") + field_u64(value, "energy_penalty"),
    })
}

fn parse_transaction_info(value: &Value) -> ChainTxStatus {
    // Not yet solidified: the node answers with an empty object.
    if value.as_object().is_none_or(|o| o.is_empty()) {
        return ChainTxStatus::Pending;
    }

    let block = value.get("blockNumber").and_then(Value::as_u64);
    if value.get("result").and_then(Value::as_str) == Some("FAILED") {
        let reason = value
            .get("resMessage")
            .and_then(Value::as_str)
            .map(decode_hex_text)
            .or_else(|| Some("transaction failed".to_string()));
        return ChainTxStatus::Failed { block, reason };
    }

    match value.pointer("/receipt/result").and_then(Value::as_str) {
        Some(result) if result != "SUCCESS" => ChainTxStatus::Failed {
            block,
            reason: Some(result.to_string()),
        },
        _ => ChainTxStatus::Confirmed { block },
    }
}

/// Check the node built the transaction we asked for.
fn verify_transaction_parties(transaction: &Value, op: &TransferOperation) -> Result<(), ChainClientError> {
    let parameters = transaction
        .pointer("/raw_data/contract/0/parameter/value")
        .ok_or_else(|| ChainClientError::InvalidResponse("transaction has no contract".to_string()))?;

    let owner = parameters.get("owner_address").and_then(Value::as_str);
    let target_key = match op.asset {
        Asset::Native => "to_address",
        Asset::Token(_) => "contract_address",
    };
    let target = parameters.get(target_key).and_then(Value::as_str);
    let expected_target = op.asset.contract().unwrap_or(&op.to);

    if owner != Some(op.from.as_str()) || target != Some(expected_target) {
        return Err(ChainClientError::InvalidResponse(
            "node returned a transaction for different parties".to_string(),
        ));
    }
    Ok(())
}

/// Sign a node-built transaction, returning its id and the signed payload.
///
/// The id is `sha256(raw_data)`; it is recomputed locally so a node cannot
/// get us to sign something other than what `raw_data_hex` describes.
fn sign_transaction(signer: &Account, mut transaction: Value) -> Result<(String, Value), ChainClientError> {
    let tx_id = transaction
        .get("txID")
        .and_then(Value::as_str)
        .ok_or_else(|| ChainClientError::InvalidResponse("transaction without txID".to_string()))?
        .to_ascii_lowercase();
    let raw_data = transaction
        .get("raw_data_hex")
        .and_then(Value::as_str)
        .ok_or_else(|| ChainClientError::InvalidResponse("transaction without raw_data_hex".to_string()))
        .and_then(|hex| {
            alloy::hex::decode(hex).map_err(|e| ChainClientError::InvalidResponse(e.to_string()))
        })?;

    let digest = Sha256::digest(&raw_data);
    if alloy::hex::encode(digest) != tx_id {
        return Err(ChainClientError::InvalidResponse(
            "txID does not match raw_data_hex".to_string(),
        ));
    }

    let (signature, recovery_id) = signer
        .signing_key()
        .sign_prehash_recoverable(&digest)
        .map_err(|e| ChainClientError::Submission(format!("signing failed: {e}")))?;
    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte() + 27);

    transaction
        .as_object_mut()
        .ok_or_else(|| ChainClientError::InvalidResponse("transaction is not an object".to_string()))?
        .insert("signature".to_string(), json!([alloy::hex::encode(bytes)]));

    Ok((tx_id, transaction))
}

/// Node messages are usually hex-encoded UTF-8.
fn decode_message(value: &Value) -> Option<String> {
    value.get("message").and_then(Value::as_str).map(decode_hex_text)
}

fn decode_hex_text(text: &str) -> String {
    match alloy::hex::decode(text) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => text.to_string(),
    }
}
