use crate::ledger::{transfers_or_empty, LedgerSource};
use crate::types::{TransferRecord, Wei};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of a payment lookup for a claimed sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentCheck {
    Confirmed { tx_hash: String, value: Wei },
    NotFound,
    /// The ledger could not be queried; treated as unpaid.
    Unavailable { reason: String },
    InvalidAddress,
}

impl PaymentCheck {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PaymentCheck::Confirmed { .. })
    }
}

pub struct PaymentVerifier {
    source: Arc<dyn LedgerSource>,
    receiver: String,
    min_amount: Wei,
}

impl PaymentVerifier {
    pub fn new(source: Arc<dyn LedgerSource>, receiver: impl Into<String>, min_amount: Wei) -> Self {
        Self {
            source,
            receiver: receiver.into(),
            min_amount,
        }
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn min_amount(&self) -> Wei {
        self.min_amount
    }

    /// Look for a single transfer from `claimed_sender` worth at least the minimum.
    /// Several smaller transfers do not add up.
    pub async fn check(&self, claimed_sender: &str) -> PaymentCheck {
        let claimed_sender = claimed_sender.trim();
        if claimed_sender.is_empty() {
            return PaymentCheck::InvalidAddress;
        }

        let fetch = transfers_or_empty(self.source.as_ref(), &self.receiver).await;

        match find_payment(&fetch.transfers, &self.receiver, claimed_sender, self.min_amount) {
            Some(tx) => {
                tracing::info!(
                    "Payment from {} confirmed by {} ({} ETH)",
                    claimed_sender,
                    tx.hash,
                    tx.value
                );
                PaymentCheck::Confirmed {
                    tx_hash: tx.hash.clone(),
                    value: tx.value,
                }
            }
            None => match fetch.warning {
                Some(reason) => PaymentCheck::Unavailable { reason },
                None => {
                    tracing::info!("No qualifying payment from {}", claimed_sender);
                    PaymentCheck::NotFound
                }
            },
        }
    }

    pub async fn has_paid(&self, claimed_sender: &str) -> bool {
        self.check(claimed_sender).await.is_confirmed()
    }
}

/// First transfer to `receiver` from `sender` carrying at least `min_amount`.
pub fn find_payment<'a>(
    transfers: &'a [TransferRecord],
    receiver: &str,
    sender: &str,
    min_amount: Wei,
) -> Option<&'a TransferRecord> {
    transfers
        .iter()
        .find(|tx| tx.is_to(receiver) && tx.is_from(sender) && tx.value >= min_amount)
}
