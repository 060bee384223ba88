// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::{AmountView, ChainId, GeneratedWallet, TokenDescriptor},
    error::{ErrorBody, ErrorDetails},
    sponsor::{OutcomeStatus, TransactionOutcome},
    state::AppState,
};

pub mod balance;
pub mod health;
pub mod transfer;
pub mod wallet;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let chain_routes = Router::new()
        .route("/{chain}/createWallet", get(wallet::create_wallet))
        .route("/{chain}/getTokenBalance", post(balance::get_token_balance))
        .route("/{chain}/getNativeBalance", post(balance::get_native_balance))
        .route("/{chain}/transfer", post(transfer::transfer))
        .route(
            "/{chain}/transferWithGasSupport",
            post(transfer::transfer_with_gas_support),
        );

    Router::new()
        .nest("/api", chain_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            tracing::info_span!(
                "http",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        wallet::create_wallet,
        balance::get_token_balance,
        balance::get_native_balance,
        transfer::transfer,
        transfer::transfer_with_gas_support,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            ChainId,
            AmountView,
            TokenDescriptor,
            GeneratedWallet,
            OutcomeStatus,
            TransactionOutcome,
            ErrorBody,
            ErrorDetails,
            wallet::WalletResponse,
            balance::TokenBalanceRequest,
            balance::NativeBalanceRequest,
            balance::AssetInfo,
            balance::BalanceData,
            balance::BalanceResponse,
            transfer::TransferBody,
            transfer::TransferResponse,
            health::ReadyResponse,
            health::ChainHealth,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Wallet", description = "Custodial wallet creation"),
        (name = "Balance", description = "Native and token balances"),
        (name = "Transfer", description = "Direct and gas-sponsored transfers"),
        (name = "Health", description = "Service health probes")
    )
)]
struct ApiDoc;
