// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodial wallet creation.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    blockchain::{Account, GeneratedWallet},
    error::{ApiError, ErrorBody},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletResponse {
    pub success: bool,
    pub data: GeneratedWallet,
}

/// Create a new random wallet for the chain.
///
/// The private key is returned once and not stored.
#[utoipa::path(
    get,
    path = "/api/{chain}/createWallet",
    tag = "Wallet",
    params(("chain" = String, Path, description = "Chain: `Bep20`/`bsc`, `polygon` or `tron`/`trc20`")),
    responses(
        (status = 200, description = "Wallet created", body = WalletResponse),
        (status = 404, description = "Unknown chain", body = ErrorBody)
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    Path(chain): Path<String>,
) -> Result<Json<WalletResponse>, ApiError> {
    let orchestrator = state.chain(&chain)?;
    let account = Account::generate(orchestrator.chain().family());
    tracing::info!(chain = %orchestrator.chain(), address = %account.address(), "Wallet created");

    Ok(Json(WalletResponse {
        success: true,
        data: GeneratedWallet::from(&account),
    }))
}
