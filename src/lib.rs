// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gas Sponsor - Custodial Multi-Chain Transfer Service
//!
//! Moves tokens out of custodial accounts on BNB Smart Chain, Polygon and
//! Tron. User accounts rarely hold native currency, so an operator account
//! tops them up with exactly enough to pay the network fee before each
//! transfer.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Chain clients, addresses, keys and amounts
//! - `sponsor` - Funding and transfer orchestration
//! - `notify` - Completion webhooks
//! - `config` - Environment configuration

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod notify;
pub mod sponsor;
pub mod state;
