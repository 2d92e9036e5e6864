//! Question source and local cache contract.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Persisted questions keyed by session id.
///
/// Questions are read once when the session loads and cleared after a
/// successful submission; nothing else in the controller touches storage.
pub trait SessionStore: Send + Sync {
    /// Returns the stored questions, or `None` when nothing is stored.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backing storage cannot be read.
    fn load_questions(&self, session_id: &str) -> Result<Option<Vec<String>>, StoreError>;

    /// Removes cached state for the session. Clearing a missing entry is `Ok`.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backing storage cannot be written.
    fn clear(&self, session_id: &str) -> Result<(), StoreError>;
}

/// Process-local store for tests and replay.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores questions for a session, replacing any previous entry.
    pub fn insert(&self, session_id: impl Into<String>, questions: Vec<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(session_id.into(), questions);
        }
    }

    /// Returns `true` when the session has cached questions.
    pub fn contains(&self, session_id: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(session_id))
            .unwrap_or(false)
    }
}

impl SessionStore for InMemorySessionStore {
    fn load_questions(&self, session_id: &str) -> Result<Option<Vec<String>>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Backend("session store lock poisoned".to_string()))?;
        Ok(entries.get(session_id).cloned())
    }

    fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Backend("session store lock poisoned".to_string()))?;
        entries.remove(session_id);
        Ok(())
    }
}

/// Session store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("session store io failure: {0}")]
    Io(#[from] std::io::Error),
    /// Stored entry is not valid JSON.
    #[error("session store decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Other backend failure.
    #[error("session store backend failure: {0}")]
    Backend(String),
}
