use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The authenticated identity cached on this client.
///
/// A session, once stored, is assumed valid until explicitly overwritten or
/// cleared; the client never re-checks token freshness against the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identity token, unique per account
    pub id: String,
    pub username: String,
    /// Advisory presence hint, unused by the auth gate
    #[serde(default)]
    pub presence: Option<String>,
    /// Stamped client-side when the session is built from a server response
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// One persistent slot holding at most one session.
///
/// `read` is synchronous and side-effect-free; it fails soft, so a missing
/// or unparseable value reads as "logged out" rather than an error.
pub trait SessionStore {
    fn read(&self) -> Option<Session>;

    /// Replace any existing value. No partial session is ever observable.
    fn write(&self, session: &Session) -> Result<()>;

    /// Remove the stored value; idempotent.
    fn clear(&self) -> Result<()>;
}

/// Session slot backed by a single JSON file.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionStore for FileSessionStore {
    fn read(&self) -> Option<Session> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Stored session unparseable, treating as logged out");
                None
            }
        }
    }

    fn write(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create session directory")?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        // Write-then-rename so a reader never observes a half-written session
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).context("Failed to write session file")?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove session file"),
        }
    }
}

/// In-memory store for tests.
#[cfg(test)]
pub struct MemorySessionStore {
    slot: std::cell::RefCell<Option<Session>>,
}

#[cfg(test)]
impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            slot: std::cell::RefCell::new(None),
        }
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            slot: std::cell::RefCell::new(Some(session)),
        }
    }
}

#[cfg(test)]
impl SessionStore for MemorySessionStore {
    fn read(&self) -> Option<Session> {
        self.slot.borrow().clone()
    }

    fn write(&self, session: &Session) -> Result<()> {
        *self.slot.borrow_mut() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.borrow_mut() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> Session {
        Session {
            id: "1".to_string(),
            username: "alice".to_string(),
            presence: None,
            created_at: Utc::now(),
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> FileSessionStore {
        FileSessionStore::new(dir.path().join("chat-app-current-user.json"))
    }

    #[test]
    fn read_returns_what_was_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let session = sample_session();

        store.write(&session).unwrap();
        assert_eq!(store.read(), Some(session));
    }

    #[test]
    fn read_is_absent_after_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.write(&sample_session()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn missing_file_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).read(), None);
    }

    #[test]
    fn garbage_file_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat-app-current-user.json");
        std::fs::write(&path, "{not json").unwrap();

        assert_eq!(FileSessionStore::new(path).read(), None);
    }

    #[test]
    fn write_replaces_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.write(&sample_session()).unwrap();
        let replacement = Session {
            id: "2".to_string(),
            username: "bob".to_string(),
            presence: Some("online".to_string()),
            created_at: Utc::now(),
        };
        store.write(&replacement).unwrap();

        assert_eq!(store.read(), Some(replacement));
    }

    #[test]
    fn older_file_without_optional_fields_still_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat-app-current-user.json");
        std::fs::write(&path, r#"{"id": "9", "username": "carol"}"#).unwrap();

        let session = FileSessionStore::new(path).read().unwrap();
        assert_eq!(session.username, "carol");
        assert_eq!(session.presence, None);
    }
}
