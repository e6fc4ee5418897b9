use crate::ledger::{transfers_or_empty, LedgerSource};
use crate::types::{PotSplit, TransferRecord, Wei};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// All-time total received by the pot wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotReading {
    pub total: Wei,
    pub warning: Option<String>,
}

pub struct PotAccumulator {
    source: Arc<dyn LedgerSource>,
    receiver: String,
    min_amount: Wei,
    winner_bps: u32,
}

impl PotAccumulator {
    pub fn new(
        source: Arc<dyn LedgerSource>,
        receiver: impl Into<String>,
        min_amount: Wei,
        winner_bps: u32,
    ) -> Self {
        Self {
            source,
            receiver: receiver.into(),
            min_amount,
            winner_bps,
        }
    }

    pub async fn total_received(&self) -> PotReading {
        let fetch = transfers_or_empty(self.source.as_ref(), &self.receiver).await;
        let total = sum_qualifying(&fetch.transfers, &self.receiver, self.min_amount);

        tracing::debug!(
            "Pot wallet {} has received {} ETH across {} transfers",
            self.receiver,
            total,
            fetch.transfers.len()
        );

        PotReading {
            total,
            warning: fetch.warning,
        }
    }

    pub fn split(&self, total: Wei) -> PotSplit {
        PotSplit::of(total, self.winner_bps)
    }

    /// Refresh `cache` if its interval has lapsed. Returns whether the ledger was queried.
    pub async fn refresh(&self, cache: &mut PotCache, interval: Duration, now: DateTime<Utc>) -> bool {
        if !cache.refresh_due(interval, now) {
            tracing::debug!("Pot cache still fresh, skipping ledger query");
            return false;
        }

        let reading = self.total_received().await;
        cache.record(reading, now);
        true
    }
}

/// Sum transfers into `receiver` worth at least `min_amount`, counting each hash once.
pub fn sum_qualifying(transfers: &[TransferRecord], receiver: &str, min_amount: Wei) -> Wei {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut total = Wei::ZERO;

    for tx in transfers {
        if !tx.is_to(receiver) || tx.value < min_amount {
            continue;
        }
        if seen.insert(tx.hash.as_str()) {
            total = total.saturating_add(tx.value);
        }
    }

    total
}

/// Last pot reading held by a session, with the time it was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotCache {
    pub total: Wei,
    pub warning: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl PotCache {
    pub fn refresh_due(&self, interval: Duration, now: DateTime<Utc>) -> bool {
        match self.fetched_at {
            None => true,
            Some(at) => match (now - at).to_std() {
                Ok(elapsed) => elapsed > interval,
                // clock went backwards
                Err(_) => false,
            },
        }
    }

    pub fn record(&mut self, reading: PotReading, now: DateTime<Utc>) {
        self.total = reading.total;
        self.warning = reading.warning;
        self.fetched_at = Some(now);
    }
}
