// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::blockchain::ChainId;
use crate::state::AppState;

/// Per-chain readiness.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainHealth {
    pub chain: ChainId,
    pub network: String,
    /// Whether `transferWithGasSupport` is available
    pub sponsorship: bool,
    /// Operator account funding sponsored transfers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_address: Option<String>,
}

/// Health check response with per-chain status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    pub status: String,
    pub chains: Vec<ChainHealth>,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check endpoint handler.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<ReadyResponse> {
    let mut chains: Vec<ChainHealth> = state
        .orchestrators()
        .map(|o| ChainHealth {
            chain: o.chain(),
            network: o.client().network().name.clone(),
            sponsorship: o.sponsorship_enabled(),
            operator_address: o.operator_address().map(str::to_string),
        })
        .collect();
    chains.sort_by_key(|c| c.chain.as_str());

    Json(ReadyResponse {
        status: "ok".to_string(),
        chains,
    })
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
