// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Completion notifications for confirmed transfers.
//!
//! Downstream systems (ledgers, back offices) learn about confirmed
//! transfers through an HTTP webhook. Delivery is best effort: a failed
//! notification is logged and never changes the outcome returned to the
//! caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::blockchain::ChainId;
use crate::sponsor::TransactionOutcome;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const FORWARDED_PATH: &str = "/forwarded";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification request failed: {0}")]
    Request(String),

    #[error("Notification endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Receives confirmed transfer outcomes.
#[async_trait]
pub trait TransferNotifier: Send + Sync {
    async fn notify(&self, outcome: &TransactionOutcome) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    chain: ChainId,
    transaction_id: &'a str,
    outcome: &'a TransactionOutcome,
}

/// Posts outcomes as JSON to `{base_url}/forwarded`.
pub struct WebhookNotifier {
    http: Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(base_url: &str) -> Result<Self, NotifyError> {
        let http = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), FORWARDED_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TransferNotifier for WebhookNotifier {
    async fn notify(&self, outcome: &TransactionOutcome) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            chain: outcome.chain(),
            transaction_id: outcome.transaction_id(),
            outcome,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Request(format!("POST {} failed: {e}", self.endpoint)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }
        Ok(())
    }
}

/// Wraps an optional notifier so delivery can never fail an orchestration.
#[derive(Clone, Default)]
pub struct BestEffortNotifier {
    inner: Option<Arc<dyn TransferNotifier>>,
}

impl BestEffortNotifier {
    pub fn new(inner: Arc<dyn TransferNotifier>) -> Self {
        Self { inner: Some(inner) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Deliver in the background; the caller never waits on the webhook.
    pub fn dispatch(&self, outcome: TransactionOutcome) {
        if !self.is_enabled() {
            return;
        }
        let notifier = self.clone();
        tokio::spawn(async move { notifier.notify(&outcome).await });
    }

    pub async fn notify(&self, outcome: &TransactionOutcome) {
        let Some(inner) = &self.inner else {
            return;
        };
        match inner.notify(outcome).await {
            Ok(()) => info!(
                chain = %outcome.chain(),
                tx_id = %outcome.transaction_id(),
                orchestration_id = %outcome.orchestration_id(),
                "Webhook delivered"
            ),
            Err(e) => warn!(
                chain = %outcome.chain(),
                tx_id = %outcome.transaction_id(),
                orchestration_id = %outcome.orchestration_id(),
                error = %e,
                "Webhook delivery failed"
            ),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    use alloy::primitives::U256;
    use uuid::Uuid;

    use crate::blockchain::Amount;
    use crate::sponsor::{OutcomeStatus, SubmittedTransfer};

    /// Records delivered outcomes, optionally failing every delivery.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub delivered: Mutex<Vec<TransactionOutcome>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        /// Number of deliveries once `expected` have arrived or the
        /// background tasks have had ample chances to run.
        pub async fn delivered_after(&self, expected: usize) -> usize {
            for _ in 0..100 {
                let delivered = self.delivered.lock().unwrap().len();
                if delivered >= expected {
                    return delivered;
                }
                tokio::task::yield_now().await;
            }
            self.delivered.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TransferNotifier for RecordingNotifier {
        async fn notify(&self, outcome: &TransactionOutcome) -> Result<(), NotifyError> {
            self.delivered.lock().unwrap().push(outcome.clone());
            if self.fail {
                Err(NotifyError::Rejected {
                    status: 502,
                    body: "bad gateway".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn outcome() -> TransactionOutcome {
        let submitted = SubmittedTransfer {
            orchestration_id: Uuid::new_v4(),
            chain: ChainId::Bsc,
            transaction_id: "0xabc".into(),
            funding_transaction_id: Some("0xf00".into()),
            from: "0xfrom".into(),
            to: "0xto".into(),
            amount: Amount::from_raw(U256::from(5u8), 0),
            token: None,
            explorer_url: "https://bscscan.com/tx/0xabc".into(),
        };
        TransactionOutcome::resolve(&submitted, OutcomeStatus::Confirmed, Some(1), 1)
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let recorder = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let notifier = BestEffortNotifier::new(recorder.clone());

        notifier.notify(&outcome()).await;
        assert_eq!(recorder.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dispatched_delivery_runs_in_the_background() {
        let recorder = Arc::new(RecordingNotifier::default());
        BestEffortNotifier::new(recorder.clone()).dispatch(outcome());
        assert_eq!(recorder.delivered_after(1).await, 1);
    }

    #[tokio::test]
    async fn disabled_notifier_is_a_no_op() {
        let notifier = BestEffortNotifier::disabled();
        assert!(!notifier.is_enabled());
        notifier.notify(&outcome()).await;
    }

    #[tokio::test]
    async fn unreachable_webhook_does_not_panic() {
        let webhook = WebhookNotifier::new("http://127.0.0.1:9/hooks/").unwrap();
        assert_eq!(webhook.endpoint(), "http://127.0.0.1:9/hooks/forwarded");
        assert!(matches!(
            webhook.notify(&outcome()).await,
            Err(NotifyError::Request(_))
        ));
        BestEffortNotifier::new(Arc::new(webhook)).notify(&outcome()).await;
    }

    #[test]
    fn payload_uses_camel_case_keys() {
        let outcome = outcome();
        let payload = serde_json::to_value(WebhookPayload {
            chain: outcome.chain(),
            transaction_id: outcome.transaction_id(),
            outcome: &outcome,
        })
        .unwrap();
        assert_eq!(payload["chain"], "bsc");
        assert_eq!(payload["transactionId"], "0xabc");
        assert_eq!(payload["outcome"]["fundingTransactionId"], "0xf00");
        assert_eq!(payload["outcome"]["status"], "confirmed");
    }
}
