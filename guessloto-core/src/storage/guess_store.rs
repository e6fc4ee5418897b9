use crate::error::Result;
use crate::storage::JsonFile;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Number of guesses shown in the recent-guesses ticker.
pub const RECENT_GUESS_LIMIT: usize = 50;

/// Append-only list of every accepted guess, shared by all sessions.
pub struct GuessLedger {
    file: JsonFile,
    write_lock: Mutex<()>,
}

impl GuessLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
            write_lock: Mutex::new(()),
        }
    }

    pub async fn append(&self, guess: u64) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut guesses: Vec<u64> = self.file.read_or_default().await;
        guesses.push(guess);
        self.file.write(&guesses).await?;

        tracing::debug!("Logged guess {} ({} total)", guess, guesses.len());
        Ok(())
    }

    /// The last `limit` guesses, oldest first.
    pub async fn recent(&self, limit: usize) -> Vec<u64> {
        let guesses = self.all().await;
        let start = guesses.len().saturating_sub(limit);
        guesses[start..].to_vec()
    }

    pub async fn all(&self) -> Vec<u64> {
        self.file.read_or_default().await
    }
}
