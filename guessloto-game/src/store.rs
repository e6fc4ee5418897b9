use crate::error::{GameError, Result};
use crate::session::GameSession;
use guessloto_core::storage::JsonFile;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

pub const SESSIONS_FILE: &str = "sessions.json";

/// Sessions keyed by an opaque id handed out to the front-end.
pub struct SessionStore {
    file: Option<JsonFile>,
    sessions: RwLock<HashMap<Uuid, GameSession>>,
    write_lock: Mutex<()>,
    round_locks: parking_lot::Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SessionStore {
    /// Sessions that live only as long as this process.
    pub fn in_memory() -> Self {
        Self {
            file: None,
            sessions: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
            round_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Sessions persisted to `path`, so stateless front-ends can resume them.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let file = JsonFile::new(path);
        let sessions: HashMap<Uuid, GameSession> = file.read_or_default().await;
        tracing::debug!("Loaded {} sessions from {}", sessions.len(), file.path().display());

        Self {
            file: Some(file),
            sessions: RwLock::new(sessions),
            write_lock: Mutex::new(()),
            round_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Serialize whole operations on one session. Hold the guard across the
    /// read, every durable write, and the final `update` of an operation.
    pub async fn lock(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self.round_locks.lock().entry(id).or_default().clone();
        lock.lock_owned().await
    }

    pub async fn insert(&self, session: GameSession) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let id = session.id();
        let (previous, snapshot) = {
            let mut sessions = self.sessions.write();
            let previous = sessions.insert(id, session);
            (previous, sessions.clone())
        };
        if let Err(e) = self.persist(&snapshot).await {
            let mut sessions = self.sessions.write();
            match previous {
                Some(previous) => sessions.insert(id, previous),
                None => sessions.remove(&id),
            };
            return Err(e);
        }
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<GameSession> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(GameError::SessionNotFound(id))
    }

    /// Mutate one session and persist the result. If the write fails the
    /// session is restored to what it was before `f` ran.
    pub async fn update<F, R>(&self, id: Uuid, f: F) -> Result<R>
    where
        F: FnOnce(&mut GameSession) -> R,
    {
        let _guard = self.write_lock.lock().await;
        let (result, previous, snapshot) = {
            let mut sessions = self.sessions.write();
            let session = sessions.get_mut(&id).ok_or(GameError::SessionNotFound(id))?;
            let previous = session.clone();
            let result = f(session);
            (result, previous, sessions.clone())
        };
        if let Err(e) = self.persist(&snapshot).await {
            tracing::warn!("Session {} not saved, keeping previous state: {}", id, e);
            self.sessions.write().insert(id, previous);
            return Err(e);
        }
        Ok(result)
    }

    pub async fn remove(&self, id: Uuid) -> Result<GameSession> {
        let _guard = self.write_lock.lock().await;
        let (removed, snapshot) = {
            let mut sessions = self.sessions.write();
            let removed = sessions.remove(&id).ok_or(GameError::SessionNotFound(id))?;
            (removed, sessions.clone())
        };
        if let Err(e) = self.persist(&snapshot).await {
            self.sessions.write().insert(id, removed);
            return Err(e);
        }
        self.round_locks.lock().remove(&id);
        Ok(removed)
    }

    /// All sessions, oldest first.
    pub fn list(&self) -> Vec<GameSession> {
        let mut sessions: Vec<GameSession> = self.sessions.read().values().cloned().collect();
        sessions.sort_by_key(|s| s.created_at());
        sessions
    }

    async fn persist(&self, snapshot: &HashMap<Uuid, GameSession>) -> Result<()> {
        if let Some(file) = &self.file {
            file.write(snapshot).await?;
        }
        Ok(())
    }
}
