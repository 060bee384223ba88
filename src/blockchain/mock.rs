// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scriptable in-memory [`ChainClient`] for tests.
//!
//! Every call is recorded. Native transfers move balances on submission so
//! post-funding checks see the top-up. Status scripts are keyed by
//! submission order: the first submitted transaction consumes script 0.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use alloy::primitives::U256;
use async_trait::async_trait;

use super::client::{ChainClient, ChainClientError, ChainTxStatus, TransferOperation};
use super::keys::Account;
use super::quote::FeeQuote;
use super::types::{Asset, ChainId, NetworkConfig, TokenMeta};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    NativeBalance(String),
    TokenBalance { address: String, token: String },
    TokenMetadata(String),
    EstimateFee(TransferOperation),
    Submit { signer: String, op: TransferOperation },
    Status(String),
}

type StatusScript = VecDeque<Result<ChainTxStatus, ChainClientError>>;

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<MockCall>,
    native_balances: HashMap<String, U256>,
    token_balances: HashMap<String, U256>,
    token_meta: Option<TokenMeta>,
    quotes: VecDeque<FeeQuote>,
    default_quote: Option<FeeQuote>,
    native_balance_error: Option<ChainClientError>,
    token_balance_error: Option<ChainClientError>,
    estimate_error: Option<ChainClientError>,
    submit_errors: HashMap<usize, ChainClientError>,
    stalled_submits: HashSet<usize>,
    status_scripts: HashMap<usize, StatusScript>,
    submitted: HashMap<String, usize>,
}

pub struct MockChainClient {
    network: NetworkConfig,
    state: Mutex<MockState>,
}

impl MockChainClient {
    pub fn new(chain: ChainId) -> Self {
        let network = match chain {
            ChainId::Bsc => NetworkConfig::bsc_mainnet("http://mock"),
            ChainId::Polygon => NetworkConfig::polygon_mainnet("http://mock"),
            ChainId::Tron => NetworkConfig::tron_mainnet("http://mock", "http://mock"),
        };
        Self {
            network,
            state: Mutex::new(MockState {
                token_meta: Some(TokenMeta {
                    decimals: Some(18),
                    symbol: Some("TKN".to_string()),
                    name: Some("Token".to_string()),
                }),
                default_quote: Some(FeeQuote::fee_market(50_000, 1_000_000_000)),
                ..MockState::default()
            }),
        }
    }

    fn key(address: &str) -> String {
        address.to_ascii_lowercase()
    }

    pub fn set_native_balance(&self, address: &str, balance: U256) {
        self.state.lock().unwrap().native_balances.insert(Self::key(address), balance);
    }

    pub fn native_balance_of(&self, address: &str) -> U256 {
        self.state
            .lock()
            .unwrap()
            .native_balances
            .get(&Self::key(address))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_token_balance(&self, address: &str, balance: U256) {
        self.state.lock().unwrap().token_balances.insert(Self::key(address), balance);
    }

    pub fn set_token_meta(&self, meta: TokenMeta) {
        self.state.lock().unwrap().token_meta = Some(meta);
    }

    /// Quote returned whenever the queue is empty.
    pub fn set_quote(&self, quote: FeeQuote) {
        self.state.lock().unwrap().default_quote = Some(quote);
    }

    /// Quotes returned by the next estimates, in order.
    pub fn push_quote(&self, quote: FeeQuote) {
        self.state.lock().unwrap().quotes.push_back(quote);
    }

    pub fn fail_native_balance(&self, err: ChainClientError) {
        self.state.lock().unwrap().native_balance_error = Some(err);
    }

    pub fn fail_token_balance(&self, err: ChainClientError) {
        self.state.lock().unwrap().token_balance_error = Some(err);
    }

    pub fn fail_estimate(&self, err: ChainClientError) {
        self.state.lock().unwrap().estimate_error = Some(err);
    }

    /// Make the `index`-th submission (0-based) fail.
    pub fn fail_submit(&self, index: usize, err: ChainClientError) {
        self.state.lock().unwrap().submit_errors.insert(index, err);
    }

    /// Make the `index`-th submission (0-based) never return.
    pub fn stall_submit(&self, index: usize) {
        self.state.lock().unwrap().stalled_submits.insert(index);
    }

    /// Statuses reported for the `index`-th submitted transaction.
    ///
    /// The last entry repeats once the script is exhausted.
    pub fn script_status(&self, index: usize, script: Vec<Result<ChainTxStatus, ChainClientError>>) {
        self.state
            .lock()
            .unwrap()
            .status_scripts
            .insert(index, script.into());
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn submissions(&self) -> Vec<TransferOperation> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Submit { op, .. } => Some(op),
                _ => None,
            })
            .collect()
    }

    pub fn status_queries(&self, tx_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, MockCall::Status(id) if id == tx_id))
            .count()
    }

    fn record(&self, call: MockCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

/// Transaction id the mock assigns to the `index`-th submission.
pub fn mock_tx_id(index: usize) -> String {
    format!("0xtx{index}")
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    async fn native_balance(&self, address: &str) -> Result<U256, ChainClientError> {
        self.record(MockCall::NativeBalance(address.to_string()));
        let state = self.state.lock().unwrap();
        if let Some(err) = &state.native_balance_error {
            return Err(err.clone());
        }
        Ok(state
            .native_balances
            .get(&Self::key(address))
            .copied()
            .unwrap_or_default())
    }

    async fn token_balance(&self, address: &str, token: &str) -> Result<U256, ChainClientError> {
        self.record(MockCall::TokenBalance {
            address: address.to_string(),
            token: token.to_string(),
        });
        let state = self.state.lock().unwrap();
        if let Some(err) = &state.token_balance_error {
            return Err(err.clone());
        }
        Ok(state
            .token_balances
            .get(&Self::key(address))
            .copied()
            .unwrap_or_default())
    }

    async fn token_metadata(&self, token: &str) -> Result<TokenMeta, ChainClientError> {
        self.record(MockCall::TokenMetadata(token.to_string()));
        let state = self.state.lock().unwrap();
        Ok(state.token_meta.clone().unwrap_or(TokenMeta {
            decimals: None,
            symbol: None,
            name: None,
        }))
    }

    async fn estimate_fee(&self, op: &TransferOperation) -> Result<FeeQuote, ChainClientError> {
        self.record(MockCall::EstimateFee(op.clone()));
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.estimate_error {
            return Err(err.clone());
        }
        if let Some(quote) = state.quotes.pop_front() {
            return Ok(quote);
        }
        state
            .default_quote
            .clone()
            .ok_or_else(|| ChainClientError::Rpc("no quote configured".to_string()))
    }

    async fn submit(
        &self,
        signer: &Account,
        op: &TransferOperation,
        _quote: &FeeQuote,
    ) -> Result<String, ChainClientError> {
        self.record(MockCall::Submit {
            signer: signer.address().to_string(),
            op: op.clone(),
        });
        let stalled = {
            let state = self.state.lock().unwrap();
            state.stalled_submits.contains(&state.submitted.len())
        };
        if stalled {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock().unwrap();
        let index = state.submitted.len();
        if let Some(err) = state.submit_errors.remove(&index) {
            // Failed broadcasts still consume an index so scripts stay aligned.
            state.submitted.insert(format!("failed-{index}"), index);
            return Err(err);
        }

        if op.asset == Asset::Native {
            let from = state.native_balances.entry(Self::key(&op.from)).or_default();
            *from = from.saturating_sub(op.amount);
            *state.native_balances.entry(Self::key(&op.to)).or_default() += op.amount;
        }

        let tx_id = mock_tx_id(index);
        state.submitted.insert(tx_id.clone(), index);
        Ok(tx_id)
    }

    async fn transaction_status(&self, tx_id: &str) -> Result<ChainTxStatus, ChainClientError> {
        self.record(MockCall::Status(tx_id.to_string()));
        let mut state = self.state.lock().unwrap();
        let Some(index) = state.submitted.get(tx_id).copied() else {
            return Ok(ChainTxStatus::Pending);
        };
        let confirmed = ChainTxStatus::Confirmed {
            block: Some(100 + index as u64),
        };
        let Some(script) = state.status_scripts.get_mut(&index) else {
            return Ok(confirmed);
        };
        match script.len() {
            0 => Ok(confirmed),
            1 => script.front().cloned().unwrap_or(Ok(confirmed)),
            _ => script.pop_front().unwrap_or(Ok(confirmed)),
        }
    }
}
