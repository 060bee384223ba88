// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Record of what an orchestration has broadcast so far.
//!
//! Written as each transaction is accepted by the node and read when the
//! orchestration deadline cuts the flow short, so the caller still learns
//! which transactions exist on-chain and how far they got.

use std::sync::{Mutex, PoisonError};

use super::error::FailureContext;
use super::types::SubmittedTransfer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingStage {
    /// Accepted by the node, finality not yet observed
    Broadcast { tx_id: String },
    Final { tx_id: String, block: Option<u64> },
}

impl FundingStage {
    pub fn tx_id(&self) -> &str {
        match self {
            FundingStage::Broadcast { tx_id } | FundingStage::Final { tx_id, .. } => tx_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JournaledTransfer {
    pub submitted: SubmittedTransfer,
    pub context: FailureContext,
}

#[derive(Debug, Default)]
pub struct TransferJournal {
    funding: Mutex<Option<FundingStage>>,
    submitting: Mutex<bool>,
    transfer: Mutex<Option<JournaledTransfer>>,
}

impl TransferJournal {
    pub fn record_funding(&self, tx_id: &str) {
        *self.funding.lock().unwrap_or_else(PoisonError::into_inner) = Some(FundingStage::Broadcast {
            tx_id: tx_id.to_string(),
        });
    }

    pub fn record_funding_final(&self, tx_id: &str, block: Option<u64>) {
        *self.funding.lock().unwrap_or_else(PoisonError::into_inner) = Some(FundingStage::Final {
            tx_id: tx_id.to_string(),
            block,
        });
    }

    /// The transfer has been handed to the node; it may be on-chain even
    /// if no id comes back.
    pub fn record_submitting(&self) {
        *self.submitting.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    pub fn record_transfer(&self, submitted: SubmittedTransfer, context: FailureContext) {
        *self.transfer.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(JournaledTransfer { submitted, context });
    }

    pub fn funding(&self) -> Option<FundingStage> {
        self.funding
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn submitting(&self) -> bool {
        *self.submitting.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn transfer(&self) -> Option<JournaledTransfer> {
        self.transfer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
