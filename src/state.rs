// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::HashMap;
use std::sync::Arc;

use crate::blockchain::{ChainClient, ChainClientError, ChainId, EvmChainClient, TronChainClient};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::notify::{BestEffortNotifier, NotifyError, WebhookNotifier};
use crate::sponsor::TransferOrchestrator;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize {chain} client: {source}")]
    Chain {
        chain: ChainId,
        #[source]
        source: ChainClientError,
    },

    #[error("Failed to initialize webhook notifier: {0}")]
    Notifier(#[from] NotifyError),
}

/// Shared handles, built once at startup.
#[derive(Clone)]
pub struct AppState {
    chains: Arc<HashMap<ChainId, Arc<TransferOrchestrator>>>,
}

impl AppState {
    pub fn new(orchestrators: impl IntoIterator<Item = TransferOrchestrator>) -> Self {
        let chains = orchestrators
            .into_iter()
            .map(|o| (o.chain(), Arc::new(o)))
            .collect();
        Self {
            chains: Arc::new(chains),
        }
    }

    /// Connect a client and orchestrator for every configured chain.
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let notifier = match &config.webhook_base_url {
            Some(url) => BestEffortNotifier::new(Arc::new(WebhookNotifier::new(url)?)),
            None => BestEffortNotifier::disabled(),
        };

        let mut orchestrators = Vec::with_capacity(config.chains.len());
        for settings in &config.chains {
            let chain = settings.chain();
            let client: Arc<dyn ChainClient> = match chain {
                ChainId::Bsc | ChainId::Polygon => Arc::new(
                    EvmChainClient::new(settings.network.clone(), config.evm_confirmations)
                        .map_err(|source| StateError::Chain { chain, source })?,
                ),
                ChainId::Tron => Arc::new(
                    TronChainClient::new(
                        settings.network.clone(),
                        config.tron_api_key.as_ref().map(|k| k.expose()),
                        config.tron_fee_limit_sun,
                    )
                    .map_err(|source| StateError::Chain { chain, source })?,
                ),
            };
            orchestrators.push(TransferOrchestrator::new(
                client,
                &settings.orchestrator,
                settings.gas_wallet.clone(),
                notifier.clone(),
            ));
        }
        Ok(Self::new(orchestrators))
    }

    /// Orchestrator for a route segment such as `Bep20` or `trc20`.
    pub fn chain(&self, segment: &str) -> Result<&Arc<TransferOrchestrator>, ApiError> {
        let chain: ChainId = segment.parse().map_err(ApiError::not_found)?;
        self.chains
            .get(&chain)
            .ok_or_else(|| ApiError::not_found(format!("Chain `{chain}` is not configured")))
    }

    pub fn orchestrators(&self) -> impl Iterator<Item = &Arc<TransferOrchestrator>> {
        self.chains.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::MockChainClient;
    use crate::sponsor::OrchestratorSettings;
    use axum::http::StatusCode;

    fn state() -> AppState {
        let orchestrator = TransferOrchestrator::new(
            Arc::new(MockChainClient::new(ChainId::Tron)),
            &OrchestratorSettings::for_family(ChainId::Tron.family()),
            None,
            BestEffortNotifier::disabled(),
        );
        AppState::new([orchestrator])
    }

    #[test]
    fn route_aliases_resolve_case_insensitively() {
        let state = state();
        for segment in ["tron", "TRC20", "Tron"] {
            assert_eq!(state.chain(segment).unwrap().chain(), ChainId::Tron);
        }
    }

    #[test]
    fn unknown_and_unconfigured_chains_are_not_found() {
        let state = state();
        for segment in ["solana", "Bep20"] {
            assert!(
                matches!(state.chain(segment), Err(e) if e.status == StatusCode::NOT_FOUND),
                "{segment} should not resolve"
            );
        }
    }

    #[test]
    fn default_config_builds_every_chain() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.orchestrators().count(), 3);
        assert!(state.orchestrators().all(|o| !o.sponsorship_enabled()));
    }
}
