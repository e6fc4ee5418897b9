use crate::error::Result;
use crate::storage::JsonFile;
use crate::types::{eth_number, PotSplit, Wei, POT_DECIMALS};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PotFile {
    #[serde(default, with = "eth_number")]
    pot_eth: Wei,
}

/// Running pot fed by per-guess contributions.
///
/// This counter is independent of what the pot wallet has received on-chain.
/// Read-modify-write cycles are serialized within one process only; two
/// processes sharing a data directory can still lose updates.
pub struct ContributionPot {
    file: JsonFile,
    write_lock: Mutex<()>,
}

impl ContributionPot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
            write_lock: Mutex::new(()),
        }
    }

    /// Current total; a missing or malformed file reads as zero.
    pub async fn load(&self) -> Wei {
        self.file.read_or_default::<PotFile>().await.pot_eth
    }

    pub async fn add_contribution(&self, amount: Wei) -> Result<Wei> {
        let _guard = self.write_lock.lock().await;

        let current = self.load().await;
        let total = current.saturating_add(amount).round_to_decimals(POT_DECIMALS);
        self.store(total).await?;

        tracing::debug!("Pot grew by {} to {} ETH", amount, total);
        Ok(total)
    }

    /// Pay out the winner share and keep the rollover as the new pot.
    pub async fn settle(&self, winner_bps: u32) -> Result<PotSplit> {
        self.settle_with(Wei::ZERO, winner_bps, |_| async { Ok(()) }).await
    }

    /// Add the winning `contribution`, split the pot, and hand the split to
    /// `record` before anything is written. The rollover replaces the pot
    /// only once `record` succeeds; on error `pot.json` is left as it was.
    pub async fn settle_with<F, Fut>(&self, contribution: Wei, winner_bps: u32, record: F) -> Result<PotSplit>
    where
        F: FnOnce(PotSplit) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let _guard = self.write_lock.lock().await;

        let total = self
            .load()
            .await
            .saturating_add(contribution)
            .round_to_decimals(POT_DECIMALS);
        let exact = PotSplit::of(total, winner_bps);
        let rollover = exact.rollover.round_to_decimals(POT_DECIMALS).min(total);
        let split = PotSplit {
            total,
            winner_share: total.saturating_sub(rollover),
            rollover,
            winner_bps: exact.winner_bps,
        };

        record(split).await?;
        self.store(rollover).await?;

        tracing::info!(
            "Pot of {} ETH settled: {} to winner, {} rolls over",
            total,
            split.winner_share,
            rollover
        );
        Ok(split)
    }

    async fn store(&self, total: Wei) -> Result<()> {
        self.file.write(&PotFile { pot_eth: total }).await
    }
}
