pub mod etherscan;

pub use etherscan::EtherscanClient;

use crate::error::Result;
use crate::types::TransferRecord;
use async_trait::async_trait;

/// Read-only source of transfer history for an address.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Fetch the first page of transfers touching `address`, newest first.
    async fn fetch_transfers(&self, address: &str) -> Result<Vec<TransferRecord>>;
}

/// Transfers plus the reason they could not be fetched, if any.
#[derive(Debug, Clone, Default)]
pub struct TransferFetch {
    pub transfers: Vec<TransferRecord>,
    pub warning: Option<String>,
}

/// Fetch transfers, degrading any ledger failure to an empty history.
pub async fn transfers_or_empty(source: &dyn LedgerSource, address: &str) -> TransferFetch {
    match source.fetch_transfers(address).await {
        Ok(transfers) => {
            tracing::debug!("Fetched {} transfers for {}", transfers.len(), address);
            TransferFetch {
                transfers,
                warning: None,
            }
        }
        Err(e) => {
            tracing::warn!("Ledger query for {} failed: {}", address, e);
            TransferFetch {
                transfers: Vec::new(),
                warning: Some(e.to_string()),
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_failure_degrades_to_empty_with_warning() {
        let ledger = FakeLedger::failing();
        let fetch = transfers_or_empty(&ledger, "0xpot").await;

        assert!(fetch.transfers.is_empty());
        assert!(fetch.warning.unwrap().contains("ledger unreachable"));
    }

    #[tokio::test]
    async fn test_success_has_no_warning() {
        let ledger = FakeLedger::with(vec![transfer("0xa", "0xpot", 1, "0x1")]);
        let fetch = transfers_or_empty(&ledger, "0xpot").await;

        assert_eq!(fetch.transfers.len(), 1);
        assert!(fetch.warning.is_none());
    }
}
