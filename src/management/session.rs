use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use crate::{types::Session, utils};

/// Process-wide session storage keyed by session id.
///
/// Sessions expire a fixed duration after creation. Expired entries are
/// dropped whenever they are read and by [`SessionStore::purge_expired`];
/// nothing is persisted, so a restart forgets every session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create(&self) -> Session {
        let now = Utc::now();
        let session = Session {
            id: utils::generate_session_id(),
            access_token: None,
            pending_state: None,
            created_at: now,
            expires_at: now + self.ttl,
            toggle_in_flight: false,
        };

        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        session
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(s) if !s.is_expired(now) => return Some(s.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions.write().await.remove(session_id);
        None
    }

    /// Stores the access token, replacing any previous one.
    ///
    /// Returns `false` when the session no longer exists.
    pub async fn set_token(&self, session_id: &str, token: String) -> bool {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(s) if !s.is_expired(now) => {
                s.access_token = Some(token);
                true
            }
            _ => false,
        }
    }

    pub async fn token(&self, session_id: &str) -> Option<String> {
        self.get(session_id).await.and_then(|s| s.access_token)
    }

    pub async fn is_authenticated(&self, session_id: &str) -> bool {
        self.token(session_id).await.is_some()
    }

    /// Records a fresh OAuth `state` nonce on the session and returns it.
    pub async fn begin_login(&self, session_id: &str) -> Option<String> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_id).filter(|s| !s.is_expired(now))?;

        let state = utils::generate_state();
        session.pending_state = Some(state.clone());
        Some(state)
    }

    /// Redeems the session's pending login `state`.
    ///
    /// Succeeds only when `state` equals the nonce recorded on this very
    /// session, which is then cleared so it cannot be replayed. A mismatch
    /// leaves the pending login untouched.
    pub async fn redeem_login_state(&self, session_id: &str, state: &str) -> bool {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(session_id).filter(|s| !s.is_expired(now)) else {
            return false;
        };
        if session.pending_state.as_deref() != Some(state) {
            return false;
        }

        session.pending_state = None;
        true
    }

    /// Marks a toggle as running for the session.
    ///
    /// Returns `None` while another toggle on the same session has not
    /// finished yet. The flag is cleared when the guard is dropped.
    pub async fn try_begin_toggle(&self, session_id: &str) -> Option<ToggleGuard> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_id)?;
        if session.toggle_in_flight {
            return None;
        }

        session.toggle_in_flight = true;
        Some(ToggleGuard {
            sessions: Arc::clone(&self.sessions),
            session_id: session_id.to_string(),
        })
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

pub struct ToggleGuard {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    session_id: String,
}

impl Drop for ToggleGuard {
    fn drop(&mut self) {
        let sessions = Arc::clone(&self.sessions);
        let session_id = std::mem::take(&mut self.session_id);

        // Drop cannot await; try the lock first and fall back to a task.
        if let Ok(mut guard) = sessions.try_write() {
            if let Some(s) = guard.get_mut(&session_id) {
                s.toggle_in_flight = false;
            }
            return;
        }

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Some(s) = sessions.write().await.get_mut(&session_id) {
                    s.toggle_in_flight = false;
                }
            });
        }
    }
}
