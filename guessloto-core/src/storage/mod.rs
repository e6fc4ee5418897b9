pub mod encryption;
pub mod guess_store;
pub mod pot_store;
pub mod winner_store;

pub use encryption::EncryptedBlob;
pub use guess_store::GuessLedger;
pub use pot_store::ContributionPot;
pub use winner_store::WinnerStore;

use crate::error::{LotoError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const GUESSES_FILE: &str = "guesses.json";
pub const POT_FILE: &str = "pot.json";
pub const WINNERS_FILE: &str = "winners.json";

/// A JSON document on disk, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw contents, or `None` when the file does not exist.
    pub async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LotoError::storage(&self.path, e)),
        }
    }

    pub async fn read<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.read_bytes().await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Missing, unreadable and malformed files all read as `T::default()`.
    pub async fn read_or_default<T: DeserializeOwned + Default>(&self) -> T {
        match self.read().await {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", self.path.display(), e);
                T::default()
            }
        }
    }

    pub async fn write<T: Serialize>(&self, value: &T) -> Result<()> {
        let content = serde_json::to_vec_pretty(value)?;
        self.write_bytes(&content).await
    }

    /// Write to a sibling temp file, then rename it over the target.
    pub async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| LotoError::storage(parent, e))?;
            }
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| LotoError::storage(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| LotoError::storage(&self.path, e))?;

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}
