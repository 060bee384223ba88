// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into an
//! [`AppConfig`]. Empty values are treated as unset.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3001` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `BSC_RPC_URL` | BNB Smart Chain JSON-RPC endpoint | `https://bsc-dataseed.binance.org` |
//! | `POLYGON_RPC_URL` | Polygon JSON-RPC endpoint | `https://polygon-rpc.com` |
//! | `TRON_API_URL` | Tron full-node HTTP API | `https://api.trongrid.io` |
//! | `TRON_SOLIDITY_URL` | Tron solidity-node HTTP API | `https://api.trongrid.io` |
//! | `TRON_API_KEY` | TronGrid API key | unset |
//! | `GAS_WALLET_PRIVATE_KEY` | Operator key shared by the EVM chains | unset |
//! | `BSC_GAS_WALLET_PRIVATE_KEY` | Operator key for BSC | `GAS_WALLET_PRIVATE_KEY` |
//! | `POLYGON_GAS_WALLET_PRIVATE_KEY` | Operator key for Polygon | `GAS_WALLET_PRIVATE_KEY` |
//! | `TRON_GAS_WALLET_PRIVATE_KEY` | Operator key for Tron | unset |
//! | `FUNDING_SAFETY_MULTIPLIER` | Factor applied to fee quotes when funding (≥ 1) | `1.2` |
//! | `SETTLE_DELAY_MS` | Pause after funding finality | `5000` |
//! | `CONFIRMATION_MAX_ATTEMPTS` | Status queries before giving up | EVM `40`, Tron `20` |
//! | `CONFIRMATION_INTERVAL_MS` | Pause between status queries | `3000` |
//! | `EVM_CONFIRMATIONS` | Blocks a receipt must be buried under | `1` |
//! | `TRON_FEE_LIMIT_SUN` | Fee limit attached to TRC-20 transfers | `100000000` |
//! | `ORCHESTRATION_TIMEOUT_SECS` | Upper bound on one transfer | `300` |
//! | `WEBHOOK_BASE_URL` | Completion webhook base URL (alias `LARAVEL_WEBHOOK_BASE`) | unset |
//!
//! A chain without an operator key still serves balances, wallet creation
//! and direct transfers; only gas-sponsored transfers are disabled.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::{Account, ChainId, NetworkConfig};
use crate::sponsor::{OrchestratorSettings, PollPolicy, SafetyMultiplier};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const BSC_RPC_URL_ENV: &str = "BSC_RPC_URL";
pub const POLYGON_RPC_URL_ENV: &str = "POLYGON_RPC_URL";
pub const TRON_API_URL_ENV: &str = "TRON_API_URL";
pub const TRON_SOLIDITY_URL_ENV: &str = "TRON_SOLIDITY_URL";
pub const TRON_API_KEY_ENV: &str = "TRON_API_KEY";

/// Operator key used by every EVM chain without its own key.
pub const GAS_WALLET_KEY_ENV: &str = "GAS_WALLET_PRIVATE_KEY";
pub const BSC_GAS_WALLET_KEY_ENV: &str = "BSC_GAS_WALLET_PRIVATE_KEY";
pub const POLYGON_GAS_WALLET_KEY_ENV: &str = "POLYGON_GAS_WALLET_PRIVATE_KEY";
pub const TRON_GAS_WALLET_KEY_ENV: &str = "TRON_GAS_WALLET_PRIVATE_KEY";

pub const SAFETY_MULTIPLIER_ENV: &str = "FUNDING_SAFETY_MULTIPLIER";
pub const SETTLE_DELAY_MS_ENV: &str = "SETTLE_DELAY_MS";
pub const CONFIRMATION_MAX_ATTEMPTS_ENV: &str = "CONFIRMATION_MAX_ATTEMPTS";
pub const CONFIRMATION_INTERVAL_MS_ENV: &str = "CONFIRMATION_INTERVAL_MS";
pub const EVM_CONFIRMATIONS_ENV: &str = "EVM_CONFIRMATIONS";
pub const TRON_FEE_LIMIT_SUN_ENV: &str = "TRON_FEE_LIMIT_SUN";
pub const ORCHESTRATION_TIMEOUT_SECS_ENV: &str = "ORCHESTRATION_TIMEOUT_SECS";

pub const WEBHOOK_BASE_URL_ENV: &str = "WEBHOOK_BASE_URL";
/// Legacy name of [`WEBHOOK_BASE_URL_ENV`].
pub const WEBHOOK_BASE_URL_ALIAS_ENV: &str = "LARAVEL_WEBHOOK_BASE";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BSC_RPC_URL: &str = "https://bsc-dataseed.binance.org";
pub const DEFAULT_POLYGON_RPC_URL: &str = "https://polygon-rpc.com";
pub const DEFAULT_TRON_API_URL: &str = "https://api.trongrid.io";
pub const DEFAULT_EVM_CONFIRMATIONS: u64 = 1;
pub const DEFAULT_TRON_FEE_LIMIT_SUN: u64 = 100_000_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl fmt::Display) -> Self {
        ConfigError::Invalid {
            var,
            reason: reason.to_string(),
        }
    }
}

/// A value that must never show up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Everything needed to serve one chain.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub network: NetworkConfig,
    /// Operator account funding sponsored transfers
    pub gas_wallet: Option<Account>,
    pub orchestrator: OrchestratorSettings,
}

impl ChainSettings {
    pub fn chain(&self) -> ChainId {
        self.network.chain
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub chains: Vec<ChainSettings>,
    pub evm_confirmations: u64,
    pub tron_api_key: Option<Secret>,
    pub tron_fee_limit_sun: u64,
    pub webhook_base_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let host = env.get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = env.parse(PORT_ENV)?.unwrap_or(DEFAULT_PORT);

        let multiplier = env
            .parse::<SafetyMultiplier>(SAFETY_MULTIPLIER_ENV)?
            .unwrap_or_default();
        let settle_delay = env
            .parse::<u64>(SETTLE_DELAY_MS_ENV)?
            .map(Duration::from_millis)
            .unwrap_or(OrchestratorSettings::DEFAULT_SETTLE_DELAY);
        let max_attempts = env.parse::<u32>(CONFIRMATION_MAX_ATTEMPTS_ENV)?;
        if max_attempts == Some(0) {
            return Err(ConfigError::invalid(CONFIRMATION_MAX_ATTEMPTS_ENV, "must be at least 1"));
        }
        let interval = env
            .parse::<u64>(CONFIRMATION_INTERVAL_MS_ENV)?
            .map(Duration::from_millis);
        let timeout = env
            .parse::<u64>(ORCHESTRATION_TIMEOUT_SECS_ENV)?
            .map(Duration::from_secs)
            .unwrap_or(OrchestratorSettings::DEFAULT_TIMEOUT);

        let orchestrator = |chain: ChainId| {
            let defaults = OrchestratorSettings::for_family(chain.family());
            let poll = PollPolicy {
                max_attempts: max_attempts.unwrap_or(defaults.transfer_poll.max_attempts),
                interval: interval.unwrap_or(defaults.transfer_poll.interval),
            };
            OrchestratorSettings {
                safety_multiplier: multiplier,
                settle_delay,
                funding_poll: poll,
                transfer_poll: poll,
                timeout,
            }
        };

        let shared_evm_key = env.get(GAS_WALLET_KEY_ENV);
        let tron_api = env.url(TRON_API_URL_ENV, DEFAULT_TRON_API_URL)?;
        let tron_solidity = env.url(TRON_SOLIDITY_URL_ENV, &tron_api)?;

        let chains = vec![
            ChainSettings {
                network: NetworkConfig::bsc_mainnet(env.url(BSC_RPC_URL_ENV, DEFAULT_BSC_RPC_URL)?),
                gas_wallet: operator(
                    BSC_GAS_WALLET_KEY_ENV,
                    env.get(BSC_GAS_WALLET_KEY_ENV).or_else(|| shared_evm_key.clone()),
                    ChainId::Bsc,
                )?,
                orchestrator: orchestrator(ChainId::Bsc),
            },
            ChainSettings {
                network: NetworkConfig::polygon_mainnet(
                    env.url(POLYGON_RPC_URL_ENV, DEFAULT_POLYGON_RPC_URL)?,
                ),
                gas_wallet: operator(
                    POLYGON_GAS_WALLET_KEY_ENV,
                    env.get(POLYGON_GAS_WALLET_KEY_ENV).or_else(|| shared_evm_key.clone()),
                    ChainId::Polygon,
                )?,
                orchestrator: orchestrator(ChainId::Polygon),
            },
            ChainSettings {
                network: NetworkConfig::tron_mainnet(tron_api, tron_solidity),
                gas_wallet: operator(
                    TRON_GAS_WALLET_KEY_ENV,
                    env.get(TRON_GAS_WALLET_KEY_ENV),
                    ChainId::Tron,
                )?,
                orchestrator: orchestrator(ChainId::Tron),
            },
        ];

        let webhook_base_url = match env
            .get(WEBHOOK_BASE_URL_ENV)
            .or_else(|| env.get(WEBHOOK_BASE_URL_ALIAS_ENV))
        {
            Some(url) => {
                url::Url::parse(&url).map_err(|e| ConfigError::invalid(WEBHOOK_BASE_URL_ENV, e))?;
                Some(url)
            }
            None => None,
        };

        Ok(Self {
            host,
            port,
            chains,
            evm_confirmations: env
                .parse(EVM_CONFIRMATIONS_ENV)?
                .unwrap_or(DEFAULT_EVM_CONFIRMATIONS),
            tron_api_key: env.get(TRON_API_KEY_ENV).map(Secret),
            tron_fee_limit_sun: env
                .parse(TRON_FEE_LIMIT_SUN_ENV)?
                .unwrap_or(DEFAULT_TRON_FEE_LIMIT_SUN),
            webhook_base_url,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn chain(&self, chain: ChainId) -> Option<&ChainSettings> {
        self.chains.iter().find(|c| c.chain() == chain)
    }
}

fn operator(var: &'static str, key: Option<String>, chain: ChainId) -> Result<Option<Account>, ConfigError> {
    key.map(|key| Account::from_private_key(&key, chain.family()))
        .transpose()
        .map_err(|e| ConfigError::invalid(var, e))
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get(name)
            .map(|v| v.parse::<T>().map_err(|e| ConfigError::invalid(name, e)))
            .transpose()
    }

    fn url(&self, name: &'static str, default: &str) -> Result<String, ConfigError> {
        let value = self.get(name).unwrap_or_else(|| default.to_string());
        url::Url::parse(&value).map_err(|e| ConfigError::invalid(name, e))?;
        Ok(value.trim_end_matches('/').to_string())
    }
}
