// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee-market chain client (BNB Smart Chain, Polygon).

use alloy::{
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    primitives::{Address, TxHash, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::TransactionRequest,
    transports::TransportError,
};
use async_trait::async_trait;
use tracing::{debug, info};

use super::address;
use super::client::{ChainClient, ChainClientError, ChainTxStatus, SubmissionLocks, TransferOperation};
use super::erc20::{self, Erc20Contract};
use super::keys::Account;
use super::quote::{FeeDetails, FeeQuote};
use super::types::{Asset, ChainFamily, NetworkConfig, TokenMeta};

/// HTTP provider type for EVM chains (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Client for an EVM fee-market chain.
pub struct EvmChainClient {
    /// Network configuration
    network: NetworkConfig,
    /// Parsed RPC endpoint, reused for per-signer providers
    url: url::Url,
    /// Read-only provider
    provider: HttpProvider,
    /// Blocks a receipt must be buried under before it counts as final
    confirmations: u64,
    locks: SubmissionLocks,
}

impl EvmChainClient {
    /// Create a new client for the specified network.
    pub fn new(network: NetworkConfig, confirmations: u64) -> Result<Self, ChainClientError> {
        if network.chain.family() != ChainFamily::FeeMarket {
            return Err(ChainClientError::InvalidRpcUrl(format!(
                "{} is not a fee-market chain",
                network.chain
            )));
        }
        let url: url::Url = network.rpc_url.parse().map_err(|e: url::ParseError| {
            ChainClientError::InvalidRpcUrl(e.to_string())
        })?;

        let provider = ProviderBuilder::new().connect_http(url.clone());

        Ok(Self {
            network,
            url,
            provider,
            confirmations: confirmations.max(1),
            locks: SubmissionLocks::new(),
        })
    }

    /// Transaction request for `op` without pricing.
    fn build_request(op: &TransferOperation) -> Result<TransactionRequest, ChainClientError> {
        let from = address::parse_evm(&op.from)?;
        let to = address::parse_evm(&op.to)?;

        let request = match &op.asset {
            Asset::Native => TransactionRequest::default().with_to(to).with_value(op.amount),
            Asset::Token(contract) => TransactionRequest::default()
                .with_to(address::parse_evm(contract)?)
                .with_input(erc20::transfer_calldata(to, op.amount)),
        };
        Ok(request.with_from(from))
    }

    fn token(&self, token: &str) -> Result<Erc20Contract<HttpProvider>, ChainClientError> {
        Ok(Erc20Contract::new(&self.provider, address::parse_evm(token)?))
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    async fn native_balance(&self, address: &str) -> Result<U256, ChainClientError> {
        let addr = address::parse_evm(address)?;
        self.provider.get_balance(addr).await.map_err(rpc_error)
    }

    async fn token_balance(&self, address: &str, token: &str) -> Result<U256, ChainClientError> {
        let addr: Address = address::parse_evm(address)?;
        self.token(token)?.balance_of(addr).await
    }

    async fn token_metadata(&self, token: &str) -> Result<TokenMeta, ChainClientError> {
        let contract = self.token(token)?;
        let (decimals, symbol, name) =
            tokio::join!(contract.decimals(), contract.symbol(), contract.name());

        if let Err(e) = &decimals {
            debug!(chain = %self.network.chain, token, error = %e, "decimals() unavailable");
        }
        Ok(TokenMeta {
            decimals: decimals.ok(),
            symbol: symbol.ok(),
            name: name.ok(),
        })
    }

    async fn estimate_fee(&self, op: &TransferOperation) -> Result<FeeQuote, ChainClientError> {
        let request = Self::build_request(op)?;
        let gas_limit = self
            .provider
            .estimate_gas(request)
            .await
            .map_err(call_error)?;
        let gas_price = self.provider.get_gas_price().await.map_err(rpc_error)?;

        Ok(FeeQuote::fee_market(gas_limit, gas_price))
    }

    async fn submit(
        &self,
        signer: &Account,
        op: &TransferOperation,
        quote: &FeeQuote,
    ) -> Result<String, ChainClientError> {
        if !signer.address().eq_ignore_ascii_case(&op.from) {
            return Err(ChainClientError::InvalidPrivateKey(format!(
                "signer {} cannot send from {}",
                signer.address(),
                op.from
            )));
        }
        let FeeDetails::FeeMarket {
            gas_limit,
            gas_price,
        } = quote.details
        else {
            return Err(ChainClientError::Submission(
                "fee-market chains need a gas quote".to_string(),
            ));
        };

        let request = Self::build_request(op)?
            .with_gas_limit(gas_limit)
            .with_gas_price(gas_price)
            .with_chain_id(self.network.chain_id);

        let wallet = EthereumWallet::from(signer.evm_signer());
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.url.clone());

        // Nonce lookup happens inside send_transaction; hold the account's
        // lock until the node has accepted the transaction.
        let _guard = self.locks.acquire(&op.from).await;
        let pending = provider
            .send_transaction(request)
            .await
            .map_err(|e| ChainClientError::Submission(e.to_string()))?;
        let tx_hash = pending.tx_hash().to_string();

        info!(
            chain = %self.network.chain,
            tx_hash = %tx_hash,
            from = %op.from,
            to = %op.to,
            gas_limit,
            gas_price,
            "Transaction broadcast"
        );
        Ok(tx_hash)
    }

    async fn transaction_status(&self, tx_id: &str) -> Result<ChainTxStatus, ChainClientError> {
        let hash: TxHash = tx_id
            .parse()
            .map_err(|_| ChainClientError::InvalidTransactionId(tx_id.to_string()))?;

        let Some(receipt) = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(rpc_error)?
        else {
            return Ok(ChainTxStatus::Pending);
        };

        let block = receipt.block_number;
        if self.confirmations > 1 {
            let Some(included) = block else {
                return Ok(ChainTxStatus::Pending);
            };
            let head = self.provider.get_block_number().await.map_err(rpc_error)?;
            if head.saturating_sub(included) + 1 < self.confirmations {
                return Ok(ChainTxStatus::Pending);
            }
        }

        if receipt.status() {
            Ok(ChainTxStatus::Confirmed { block })
        } else {
            Ok(ChainTxStatus::Failed {
                block,
                reason: Some("execution reverted".to_string()),
            })
        }
    }
}

fn rpc_error(err: TransportError) -> ChainClientError {
    ChainClientError::Rpc(err.to_string())
}

/// Gas estimation runs the call: an error response is a revert, not an outage.
fn call_error(err: TransportError) -> ChainClientError {
    if err.is_error_resp() {
        ChainClientError::ContractCall(err.to_string())
    } else {
        ChainClientError::Rpc(err.to_string())
    }
}
