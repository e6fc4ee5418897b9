//! Guess Loto core - payment checks, pot accounting and flat-file persistence
//!
//! A block explorer is the only source of truth for payments. Everything the
//! game writes lives in three small JSON documents in a data directory.

pub mod config;
pub mod error;
pub mod ledger;
pub mod payment;
pub mod storage;
pub mod types;

pub use config::GameConfig;
pub use error::{LotoError, Result};
pub use ledger::{EtherscanClient, LedgerSource};
pub use payment::{PaymentCheck, PaymentVerifier, PotAccumulator, PotCache, PotReading};
pub use storage::{ContributionPot, GuessLedger, WinnerStore};
pub use types::{PotSplit, TransferRecord, Wei, WinnerRecord};

use std::path::Path;
use std::sync::Arc;

/// Ledger-backed services and file stores for one data directory.
pub struct LotoServices {
    pub config: GameConfig,
    pub verifier: PaymentVerifier,
    pub accumulator: PotAccumulator,
    pub guesses: GuessLedger,
    pub pot: ContributionPot,
    pub winners: WinnerStore,
}

impl LotoServices {
    /// Wire the services against the public block explorer.
    pub fn new(config: GameConfig, data_dir: &Path) -> Result<Self> {
        config.validate()?;
        let client = EtherscanClient::new(
            config.etherscan_url.clone(),
            config.etherscan_api_key.clone(),
            config.request_timeout,
        )?;
        Ok(Self::with_ledger(config, data_dir, Arc::new(client)))
    }

    /// Wire the services against any ledger source.
    pub fn with_ledger(config: GameConfig, data_dir: &Path, ledger: Arc<dyn LedgerSource>) -> Self {
        let verifier = PaymentVerifier::new(ledger.clone(), &config.wallet_address, config.min_amount);
        let accumulator = PotAccumulator::new(
            ledger,
            &config.wallet_address,
            config.min_amount,
            config.winner_share_bps,
        );

        Self {
            verifier,
            accumulator,
            guesses: GuessLedger::new(data_dir.join(storage::GUESSES_FILE)),
            pot: ContributionPot::new(data_dir.join(storage::POT_FILE)),
            winners: WinnerStore::new(data_dir.join(storage::WINNERS_FILE), config.secret_key.clone()),
            config,
        }
    }
}
