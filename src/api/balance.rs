// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Balance query endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    blockchain::{AmountView, ChainId},
    error::{ApiError, ErrorBody},
    sponsor::{Balance, TransferOrchestrator},
    state::AppState,
};

/// Token balance request. Without `tokenContract` the native balance is
/// returned.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceRequest {
    pub token_contract: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NativeBalanceRequest {
    pub address: Option<String>,
}

/// Asset a balance is denominated in.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    /// Token contract, absent for the native currency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    pub symbol: String,
    /// `native`, `BEP20`, `ERC20` or `TRC20`
    #[serde(rename = "type")]
    pub kind: String,
    pub decimals: u8,
    /// True when the contract did not report its decimals and 18 was assumed
    pub decimals_defaulted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceData {
    pub wallet: String,
    pub chain: ChainId,
    pub network: String,
    pub token: AssetInfo,
    pub balance: AmountView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub success: bool,
    pub data: BalanceData,
}

fn token_standard(chain: ChainId) -> &'static str {
    match chain {
        ChainId::Bsc => "BEP20",
        ChainId::Polygon => "ERC20",
        ChainId::Tron => "TRC20",
    }
}

fn required_address(address: Option<String>) -> Result<String, ApiError> {
    address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::bad_request("Address is required"))
}

fn respond(orchestrator: &TransferOrchestrator, balance: Balance) -> Json<BalanceResponse> {
    let chain = orchestrator.chain();
    let token = match balance.token {
        Some(token) => AssetInfo {
            contract: Some(token.contract),
            symbol: token.symbol,
            kind: token_standard(chain).to_string(),
            decimals: token.decimals,
            decimals_defaulted: token.decimals_defaulted,
        },
        None => AssetInfo {
            contract: None,
            symbol: balance.symbol,
            kind: "native".to_string(),
            decimals: balance.amount.decimals(),
            decimals_defaulted: false,
        },
    };

    Json(BalanceResponse {
        success: true,
        data: BalanceData {
            wallet: balance.address,
            chain,
            network: orchestrator.client().network().name.clone(),
            token,
            balance: balance.amount.into(),
        },
    })
}

/// Balance of an address in a token, or in the native currency when no
/// token contract is given.
#[utoipa::path(
    post,
    path = "/api/{chain}/getTokenBalance",
    tag = "Balance",
    params(("chain" = String, Path, description = "Chain: `Bep20`/`bsc`, `polygon` or `tron`/`trc20`")),
    request_body = TokenBalanceRequest,
    responses(
        (status = 200, description = "Balance retrieved", body = BalanceResponse),
        (status = 400, description = "Invalid address or contract", body = ErrorBody),
        (status = 404, description = "Unknown chain", body = ErrorBody),
        (status = 500, description = "Chain unreachable", body = ErrorBody)
    )
)]
pub async fn get_token_balance(
    State(state): State<AppState>,
    Path(chain): Path<String>,
    body: Result<Json<TokenBalanceRequest>, JsonRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let orchestrator = state.chain(&chain)?;
    let Json(request) = body?;
    let address = required_address(request.address)?;
    let token = request
        .token_contract
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let balance = orchestrator
        .balances()
        .balance_of(&address, token.as_deref())
        .await?;
    Ok(respond(orchestrator, balance))
}

/// Native currency balance of an address.
#[utoipa::path(
    post,
    path = "/api/{chain}/getNativeBalance",
    tag = "Balance",
    params(("chain" = String, Path, description = "Chain: `Bep20`/`bsc`, `polygon` or `tron`/`trc20`")),
    request_body = NativeBalanceRequest,
    responses(
        (status = 200, description = "Balance retrieved", body = BalanceResponse),
        (status = 400, description = "Invalid address", body = ErrorBody),
        (status = 404, description = "Unknown chain", body = ErrorBody),
        (status = 500, description = "Chain unreachable", body = ErrorBody)
    )
)]
pub async fn get_native_balance(
    State(state): State<AppState>,
    Path(chain): Path<String>,
    body: Result<Json<NativeBalanceRequest>, JsonRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let orchestrator = state.chain(&chain)?;
    let Json(request) = body?;
    let address = required_address(request.address)?;

    let balance = orchestrator.balances().balance_of(&address, None).await?;
    Ok(respond(orchestrator, balance))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, call};
    use crate::blockchain::{ChainClientError, TokenMeta};
    use alloy::primitives::U256;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    const HOLDER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const TOKEN: &str = "0x55d398326f99059fF775485246999027B3197955";

    #[tokio::test]
    async fn token_balance_reports_raw_and_formatted() {
        let app = app();
        app.bsc.set_token_balance(HOLDER, U256::from(12_500_000u64));
        app.bsc.set_token_meta(TokenMeta {
            decimals: Some(6),
            symbol: Some("USDT".into()),
            name: None,
        });

        let (status, body) = call(
            &app.router,
            Method::POST,
            "/api/Bep20/getTokenBalance",
            Some(json!({ "tokenContract": TOKEN, "address": HOLDER.to_lowercase() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["wallet"], HOLDER);
        assert_eq!(data["token"]["symbol"], "USDT");
        assert_eq!(data["token"]["type"], "BEP20");
        assert_eq!(data["token"]["decimalsDefaulted"], false);
        assert_eq!(data["balance"]["raw"], "12500000");
        assert_eq!(data["balance"]["formatted"], "12.5");
    }

    #[tokio::test]
    async fn missing_token_contract_falls_back_to_native() {
        let app = app();
        app.bsc.set_native_balance(HOLDER, U256::from(10u64).pow(U256::from(18u8)));

        let (status, body) = call(
            &app.router,
            Method::POST,
            "/api/bsc/getTokenBalance",
            Some(json!({ "tokenContract": "", "address": HOLDER })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["token"]["type"], "native");
        assert_eq!(body["data"]["token"]["symbol"], "BNB");
        assert_eq!(body["data"]["balance"]["formatted"], "1");
    }

    #[tokio::test]
    async fn native_balance_on_tron_uses_sun_precision() {
        let app = app();
        let holder = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
        app.tron.set_native_balance(holder, U256::from(2_500_000u64));

        let (status, body) = call(
            &app.router,
            Method::POST,
            "/api/tron/getNativeBalance",
            Some(json!({ "address": holder })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["token"]["symbol"], "TRX");
        assert_eq!(body["data"]["balance"]["formatted"], "2.5");
    }

    #[tokio::test]
    async fn missing_or_invalid_address_is_bad_request() {
        let app = app();
        let (status, body) = call(&app.router, Method::POST, "/api/bsc/getNativeBalance", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Address is required");

        let (status, body) = call(
            &app.router,
            Method::POST,
            "/api/bsc/getNativeBalance",
            Some(json!({ "address": "0x1234" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ADDRESS");
    }

    #[tokio::test]
    async fn unreachable_node_is_a_server_error() {
        let app = app();
        app.bsc.fail_native_balance(ChainClientError::Rpc("connection refused".into()));

        let (status, body) = call(
            &app.router,
            Method::POST,
            "/api/bsc/getNativeBalance",
            Some(json!({ "address": HOLDER })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "CHAIN_UNREACHABLE");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = app();
        let (status, body) = call(
            &app.router,
            Method::POST,
            "/api/bsc/getNativeBalance",
            Some(json!("not an object")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
