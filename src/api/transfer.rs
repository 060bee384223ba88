// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer endpoints.
//!
//! Both endpoints block until the transfer is final (or has failed) and
//! report the outcome. Failures carry `retrySafe`: when false, something was
//! broadcast and the response names the transaction ids.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    blockchain::{Account, ChainId},
    error::{ApiError, ErrorBody},
    sponsor::{TransactionOutcome, TransferOrchestrator, TransferRequest},
    state::AppState,
};

/// Amounts arrive as JSON strings (`"12.5"`) or numbers (`12.5`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Text(String),
    Number(serde_json::Number),
}

impl AmountInput {
    fn into_text(self) -> String {
        match self {
            AmountInput::Text(text) => text.trim().to_string(),
            AmountInput::Number(number) => plain_decimal(&number.to_string()),
        }
    }
}

/// Rewrite `1e-7` or `1.5e21` as plain decimal digits. Anything else is
/// returned unchanged and left to amount validation.
fn plain_decimal(text: &str) -> String {
    let Some((mantissa, exponent)) = text.split_once(['e', 'E']) else {
        return text.to_string();
    };
    let Ok(exponent) = exponent.parse::<i64>() else {
        return text.to_string();
    };
    // f64 exponents stay within this range
    if exponent.abs() > 400 {
        return text.to_string();
    }
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return text.to_string();
    }

    let digits = format!("{whole}{fraction}");
    let point = whole.len() as i64 + exponent;
    let expanded = if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if point as usize >= digits.len() {
        format!("{digits}{}", "0".repeat(point as usize - digits.len()))
    } else {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    };
    format!("{sign}{expanded}")
}

/// Transfer request body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferBody {
    /// `BNP` on BSC or `MATIC` on Polygon sends the native currency through
    /// `/transfer`; `tokenContract` is then ignored
    pub mode: Option<String>,
    /// Hex private key of the source account
    pub from_private_key: Option<String>,
    /// Source address; when present it must match the key
    pub from_account: Option<String>,
    /// Token contract, required unless `mode` selects the native currency
    pub token_contract: Option<String>,
    pub to_address: Option<String>,
    /// Human-scaled amount, string or number
    #[schema(value_type = Option<String>, example = "12.5")]
    pub amount: Option<AmountInput>,
}

impl TransferBody {
    /// Native transfers are only honoured when `native_allowed` and `mode`
    /// names the chain's native currency; every other request needs a token.
    fn into_request(self, chain: ChainId, native_allowed: bool) -> Result<TransferRequest, ApiError> {
        let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let native = native_allowed
            && chain
                .native_transfer_mode()
                .is_some_and(|mode| self.mode.as_deref().map(str::trim) == Some(mode));
        let private_key = present(self.from_private_key);
        let token = if native { None } else { present(self.token_contract) };
        let destination = present(self.to_address);
        let amount = self.amount.map(AmountInput::into_text).filter(|a| !a.is_empty());

        let missing: Vec<&str> = [
            ("fromPrivateKey", private_key.is_none()),
            ("tokenContract", !native && token.is_none()),
            ("toAddress", destination.is_none()),
            ("amount", amount.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (true, Some(private_key), Some(destination), Some(amount)) =
            (missing.is_empty(), private_key, destination, amount)
        else {
            return Err(ApiError::bad_request(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let claimed = present(self.from_account);
        let source = Account::with_claimed_address(&private_key, claimed.as_deref(), chain.family())?;

        Ok(TransferRequest {
            source,
            token,
            destination,
            amount,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResponse {
    pub success: bool,
    pub message: String,
    pub data: TransactionOutcome,
}

impl TransferResponse {
    fn new(orchestrator: &TransferOrchestrator, outcome: TransactionOutcome) -> Self {
        let symbol = outcome
            .token()
            .map(|t| t.symbol.clone())
            .unwrap_or_else(|| orchestrator.client().network().native_symbol.to_string());
        Self {
            success: true,
            message: format!("{symbol} transferred successfully"),
            data: outcome,
        }
    }
}

/// Transfer from a custodial account that pays its own fee.
#[utoipa::path(
    post,
    path = "/api/{chain}/transfer",
    tag = "Transfer",
    params(("chain" = String, Path, description = "Chain: `Bep20`/`bsc`, `polygon` or `tron`/`trc20`")),
    request_body = TransferBody,
    responses(
        (status = 200, description = "Transfer confirmed", body = TransferResponse),
        (status = 400, description = "Invalid request or insufficient balance", body = ErrorBody),
        (status = 404, description = "Unknown chain", body = ErrorBody),
        (status = 500, description = "Submission or on-chain failure", body = ErrorBody)
    )
)]
pub async fn transfer(
    State(state): State<AppState>,
    Path(chain): Path<String>,
    body: Result<Json<TransferBody>, JsonRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    let orchestrator = state.chain(&chain)?;
    let Json(body) = body?;
    let request = body.into_request(orchestrator.chain(), true)?;

    let outcome = orchestrator.direct_transfer(request).await?;
    Ok(Json(TransferResponse::new(orchestrator, outcome)))
}

/// Transfer with the network fee sponsored by the operator account.
///
/// The source account is first topped up with native currency, the top-up
/// is awaited to finality, and only then is the transfer signed.
#[utoipa::path(
    post,
    path = "/api/{chain}/transferWithGasSupport",
    tag = "Transfer",
    params(("chain" = String, Path, description = "Chain: `Bep20`/`bsc`, `polygon` or `tron`/`trc20`")),
    request_body = TransferBody,
    responses(
        (status = 200, description = "Transfer confirmed", body = TransferResponse),
        (status = 400, description = "Invalid request or insufficient balance", body = ErrorBody),
        (status = 404, description = "Unknown chain", body = ErrorBody),
        (status = 500, description = "Funding, submission or on-chain failure", body = ErrorBody),
        (status = 503, description = "Gas sponsorship not configured for this chain", body = ErrorBody)
    )
)]
pub async fn transfer_with_gas_support(
    State(state): State<AppState>,
    Path(chain): Path<String>,
    body: Result<Json<TransferBody>, JsonRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    let orchestrator = state.chain(&chain)?;
    if !orchestrator.sponsorship_enabled() {
        return Err(ApiError::service_unavailable(format!(
            "Gas sponsorship is not configured for {}",
            orchestrator.chain().display_name()
        )));
    }
    let Json(body) = body?;
    let request = body.into_request(orchestrator.chain(), false)?;

    let outcome = orchestrator.sponsored_transfer(request).await?;
    Ok(Json(TransferResponse::new(orchestrator, outcome)))
}
