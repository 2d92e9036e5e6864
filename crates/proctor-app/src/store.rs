//! Directory-backed session store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use proctor_session::{SessionStore, StoreError};

const FILE_PREFIX: &str = "interview_";

/// Stores each session's questions as a JSON array in
/// `interview_<sessionId>.json` under one directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    /// Creates a store rooted at `root`. The directory is created on first
    /// write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes questions for a session, replacing any previous entry.
    ///
    /// # Errors
    /// Returns [`StoreError`] for an unsafe session id or a filesystem
    /// failure.
    pub fn save_questions(&self, session_id: &str, questions: &[String]) -> Result<(), StoreError> {
        let path = self.path_for(session_id)?;
        std::fs::create_dir_all(&self.root)?;
        let body = serde_json::to_vec_pretty(questions)?;
        std::fs::write(path, body)?;
        Ok(())
    }

    /// File path used for a session id.
    ///
    /// # Errors
    /// Returns [`StoreError::Backend`] when the id is empty or could escape
    /// the store directory.
    pub fn path_for(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        let safe = !session_id.is_empty()
            && session_id
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'));
        if !safe {
            return Err(StoreError::Backend(format!(
                "session id {session_id:?} is not a safe file name"
            )));
        }
        Ok(self.root.join(format!("{FILE_PREFIX}{session_id}.json")))
    }
}

impl SessionStore for FileSessionStore {
    fn load_questions(&self, session_id: &str) -> Result<Option<Vec<String>>, StoreError> {
        let path = self.path_for(session_id)?;
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(session_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "cached interview removed");
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}
