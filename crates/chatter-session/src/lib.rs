//! Persisted session state: tokens plus the current user identity.
//!
//! The store is a single in-memory state guarded by a mutex, flushed to
//! a JSON file on every mutation so a restart resumes the session. Only
//! the four session fields are persisted, nothing else.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use chatter_types::models::User;

/// The four persisted session fields.
///
/// Invariant: `is_authenticated` is true iff `access_token` is set.
/// Re-derived on load so a hand-edited file cannot violate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub current_user: Option<User>,
    pub is_authenticated: bool,
}

pub struct SessionStore {
    path: PathBuf,
    state: Mutex<SessionState>,
}

impl SessionStore {
    /// Open the store backed by `path`. An unreadable or corrupt file
    /// starts a logged-out session rather than failing; the session is
    /// always recoverable by logging in again.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut state = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<SessionState>(&text) {
                Ok(state) => state,
                Err(e) => {
                    warn!("Discarding corrupt session file {}: {}", path.display(), e);
                    SessionState::default()
                }
            },
            Err(_) => SessionState::default(),
        };
        state.is_authenticated = state.access_token.is_some();

        info!(
            "Session store opened at {} (authenticated: {})",
            path.display(),
            state.is_authenticated
        );
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    /// Set all four fields and mark the session authenticated.
    pub fn set_auth(
        &self,
        access_token: String,
        refresh_token: Option<String>,
        user: Option<User>,
    ) {
        self.mutate(|state| {
            state.access_token = Some(access_token);
            state.refresh_token = refresh_token;
            state.current_user = user;
            state.is_authenticated = true;
        });
    }

    /// Replace the cached identity without touching tokens.
    pub fn set_user(&self, user: User) {
        self.mutate(|state| state.current_user = Some(user));
    }

    /// Clear all four fields.
    pub fn logout(&self) {
        self.mutate(|state| *state = SessionState::default());
    }

    pub fn access_token(&self) -> Option<String> {
        self.lock().access_token.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.lock().current_user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mutate(&self, f: impl FnOnce(&mut SessionState)) {
        let mut state = self.lock();
        f(&mut state);
        self.persist(&state);
    }

    /// Best-effort flush. A failed write keeps the in-memory session
    /// usable for the rest of the process lifetime.
    fn persist(&self, state: &SessionState) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Cannot create session dir {}: {}", parent.display(), e);
                return;
            }
        }
        match serde_json::to_string_pretty(state) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!("Cannot persist session to {}: {}", self.path.display(), e);
                }
            }
            Err(e) => warn!("Cannot serialize session state: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn temp_store(name: &str) -> SessionStore {
        let dir = std::env::temp_dir().join("chatter_session_test");
        let _ = fs::remove_file(dir.join(name));
        SessionStore::open(dir.join(name))
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            name: "Alice".into(),
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn starts_logged_out() {
        let store = temp_store("fresh.json");
        assert!(!store.is_authenticated());
        assert!(store.access_token().is_none());
        assert!(store.current_user().is_none());
    }

    #[test]
    fn set_auth_marks_authenticated() {
        let store = temp_store("set_auth.json");
        store.set_auth("tok".into(), Some("refresh".into()), Some(sample_user()));
        assert!(store.is_authenticated());
        assert_eq!(store.access_token().as_deref(), Some("tok"));
        assert_eq!(store.snapshot().refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn set_user_keeps_tokens() {
        let store = temp_store("set_user.json");
        store.set_auth("tok".into(), None, None);
        store.set_user(sample_user());
        assert_eq!(store.access_token().as_deref(), Some("tok"));
        assert_eq!(store.current_user().unwrap().username, "alice");
    }

    #[test]
    fn logout_clears_everything() {
        let store = temp_store("logout.json");
        store.set_auth("tok".into(), Some("refresh".into()), Some(sample_user()));
        store.logout();
        let state = store.snapshot();
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn survives_reopen() {
        let path = std::env::temp_dir()
            .join("chatter_session_test")
            .join("reopen.json");
        let _ = fs::remove_file(&path);

        let user = sample_user();
        {
            let store = SessionStore::open(path.clone());
            store.set_auth("tok".into(), Some("refresh".into()), Some(user.clone()));
        }

        let reopened = SessionStore::open(path.clone());
        assert!(reopened.is_authenticated());
        assert_eq!(reopened.access_token().as_deref(), Some("tok"));
        assert_eq!(reopened.current_user().unwrap().id, user.id);
    }

    #[test]
    fn corrupt_file_starts_logged_out() {
        let path = std::env::temp_dir()
            .join("chatter_session_test")
            .join("corrupt.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"not json {").unwrap();

        let store = SessionStore::open(path.clone());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn authenticated_flag_rederived_on_load() {
        let path = std::env::temp_dir()
            .join("chatter_session_test")
            .join("rederive.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        // A file claiming authentication without a token must load logged out.
        fs::write(
            &path,
            br#"{"accessToken":null,"refreshToken":null,"currentUser":null,"isAuthenticated":true}"#,
        )
        .unwrap();

        let store = SessionStore::open(path.clone());
        assert!(!store.is_authenticated());
    }
}
