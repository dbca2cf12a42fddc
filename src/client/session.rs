use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// An authenticated client session. The on-disk representation uses the
/// stable `token` / `userId` / `expiryDate` keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "expiryDate")]
    pub expiry_date: DateTime<Utc>,
}

/// Durable session storage: one JSON file standing in for the browser's
/// localStorage, so a restart restores the session.
#[derive(Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// An unreadable or unparsable file counts as "no stored session".
    pub fn load(&self) -> Option<Session> {
        let raw = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    pub fn save(&self, session: &Session) {
        match serde_json::to_string_pretty(session) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!("failed to persist session: {}", e);
                }
            }
            Err(e) => warn!("failed to serialize session: {}", e),
        }
    }

    pub fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Owns the session lifecycle: restore on startup, login, explicit logout,
/// and the auto-logout timer that fires exactly when the token expires.
/// The timer is the only background task and is aborted on logout or drop
/// so it can never fire against a cleared session.
pub struct SessionManager {
    state: Arc<Mutex<Option<Session>>>,
    store: SessionStore,
    timer: Option<JoinHandle<()>>,
}

impl SessionManager {
    pub fn new(store: SessionStore) -> Self {
        Self {
            state: Arc::new(Mutex::new(None)),
            store,
            timer: None,
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.state.lock().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().unwrap().is_some()
    }

    /// Load the stored session. A session whose expiry already passed is
    /// cleared immediately; a live one is restored with an auto-logout
    /// scheduled for the remaining duration. Returns whether a session
    /// was restored.
    pub fn restore(&mut self) -> bool {
        let Some(session) = self.store.load() else {
            return false;
        };

        let remaining = session.expiry_date - Utc::now();
        if remaining <= chrono::Duration::zero() {
            self.store.clear();
            return false;
        }

        *self.state.lock().unwrap() = Some(session);
        self.schedule_auto_logout(remaining.to_std().unwrap_or_default());
        true
    }

    /// Record a fresh login and schedule auto-logout for the full lifetime.
    pub fn login(&mut self, token: String, user_id: Uuid, expires_in_secs: i64) -> Session {
        let session = Session {
            token,
            user_id,
            expiry_date: Utc::now() + chrono::Duration::seconds(expires_in_secs),
        };
        self.store.save(&session);
        *self.state.lock().unwrap() = Some(session.clone());
        self.schedule_auto_logout(Duration::from_secs(expires_in_secs.max(0) as u64));
        session
    }

    /// Explicit logout: cancels the pending timer and clears both the
    /// in-memory state and the stored file.
    pub fn logout(&mut self) {
        self.cancel_timer();
        self.state.lock().unwrap().take();
        self.store.clear();
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    fn schedule_auto_logout(&mut self, after: Duration) {
        self.cancel_timer();
        let state = Arc::clone(&self.state);
        let store = self.store.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            state.lock().unwrap().take();
            store.clear();
        }));
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> SessionStore {
        let path = std::env::temp_dir().join(format!("feedline-session-{}.json", Uuid::new_v4()));
        SessionStore::new(path)
    }

    fn stored_session(store: &SessionStore, expiry: DateTime<Utc>) -> Session {
        let session = Session {
            token: "tok".to_string(),
            user_id: Uuid::new_v4(),
            expiry_date: expiry,
        };
        store.save(&session);
        session
    }

    #[tokio::test]
    async fn restore_with_expired_session_clears_the_store() {
        let store = temp_store();
        stored_session(&store, Utc::now() - chrono::Duration::seconds(10));

        let mut mgr = SessionManager::new(store.clone());
        assert!(!mgr.restore());
        assert!(!mgr.is_authenticated());
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn restore_with_live_session_keeps_it() {
        let store = temp_store();
        let saved = stored_session(&store, Utc::now() + chrono::Duration::hours(1));

        let mut mgr = SessionManager::new(store.clone());
        assert!(mgr.restore());
        let current = mgr.current().unwrap();
        assert_eq!(current.user_id, saved.user_id);
        assert_eq!(current.token, saved.token);
        mgr.logout();
    }

    #[tokio::test(start_paused = true)]
    async fn auto_logout_fires_when_the_lifetime_elapses() {
        let store = temp_store();
        let mut mgr = SessionManager::new(store.clone());
        mgr.login("tok".to_string(), Uuid::new_v4(), 3600);
        assert!(mgr.is_authenticated());

        // let the timer task register its sleep before advancing the clock
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(3601)).await;
        // let the timer task run
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert!(!mgr.is_authenticated());
        assert!(store.load().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_logout_cancels_the_pending_timer() {
        let store = temp_store();
        let mut mgr = SessionManager::new(store.clone());
        mgr.login("tok".to_string(), Uuid::new_v4(), 3600);
        mgr.logout();

        assert!(!mgr.is_authenticated());
        assert!(store.load().is_none());

        // advancing past the original expiry must be a no-op now
        tokio::time::advance(Duration::from_secs(7200)).await;
        tokio::task::yield_now().await;
        assert!(!mgr.is_authenticated());
    }

    #[tokio::test]
    async fn login_persists_the_expected_keys() {
        let store = temp_store();
        let mut mgr = SessionManager::new(store.clone());
        mgr.login("tok".to_string(), Uuid::new_v4(), 3600);

        let raw = fs::read_to_string(&store.path).unwrap();
        assert!(raw.contains("\"token\""));
        assert!(raw.contains("\"userId\""));
        assert!(raw.contains("\"expiryDate\""));
        mgr.logout();
    }
}
