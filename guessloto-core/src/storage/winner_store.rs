use crate::error::{LotoError, Result};
use crate::storage::encryption::{decrypt_data, encrypt_data, EncryptedBlob};
use crate::storage::JsonFile;
use crate::types::{Wei, WinnerRecord};
use chrono::Utc;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Number of past winners shown on the paywall.
pub const RECENT_WINNER_LIMIT: usize = 3;

/// Past round outcomes, encrypted at rest when a passphrase is configured.
pub struct WinnerStore {
    file: JsonFile,
    passphrase: Option<String>,
    write_lock: Mutex<()>,
}

impl WinnerStore {
    pub fn new(path: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        Self {
            file: JsonFile::new(path),
            passphrase,
            write_lock: Mutex::new(()),
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.passphrase.is_some()
    }

    /// Every record, oldest first. Anything unreadable yields an empty list.
    pub async fn all(&self) -> Vec<WinnerRecord> {
        match self.load().await {
            Ok(winners) => winners,
            Err(e) => {
                tracing::warn!(
                    "Could not read winners from {}: {}",
                    self.file.path().display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// The last `limit` winners, most recent first.
    pub async fn recent(&self, limit: usize) -> Vec<WinnerRecord> {
        self.all().await.into_iter().rev().take(limit).collect()
    }

    /// Refuses to write over a file it cannot read, so a wrong key never
    /// clobbers existing history.
    pub async fn append(&self, winner: impl Into<String>, amount: Wei) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut winners = self.load().await?;
        let record = WinnerRecord {
            winner: winner.into(),
            amount,
            recorded_at: Some(Utc::now()),
        };
        tracing::info!("Recording winner {} ({} ETH)", record.winner, record.amount);
        winners.push(record);

        let json = serde_json::to_vec(&winners)?;
        match &self.passphrase {
            Some(passphrase) => {
                let blob = encrypt_data(&json, passphrase)?;
                self.file.write(&blob).await
            }
            None => self.file.write(&winners).await,
        }
    }

    async fn load(&self) -> Result<Vec<WinnerRecord>> {
        let bytes = match self.file.read_bytes().await? {
            Some(bytes) => bytes,
            None => return Ok(Vec::new()),
        };

        match &self.passphrase {
            Some(passphrase) => {
                let blob: EncryptedBlob = serde_json::from_slice(&bytes)
                    .map_err(|e| LotoError::crypto(format!("Not an encrypted winners file: {}", e)))?;
                let plain = decrypt_data(&blob, passphrase)?;
                Ok(serde_json::from_slice(&plain)?)
            }
            None => Ok(serde_json::from_slice(&bytes)?),
        }
    }
}
