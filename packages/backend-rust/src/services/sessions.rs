use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use shuxue_algo::PlaySession;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};

pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;

/// Handle to a live play session
#[derive(Clone)]
pub struct SessionTicket {
    pub id: String,
    pub session: Arc<Mutex<PlaySession>>,
}

struct SessionEntry {
    user_id: String,
    level_id: String,
    started_at: DateTime<Utc>,
    session: Arc<Mutex<PlaySession>>,
}

impl SessionEntry {
    fn expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.started_at > ttl
    }
}

/// Live play sessions keyed by id. Each session belongs to the learner who
/// started it; lookups by anyone else behave as if it did not exist.
///
/// Sessions live at most `ttl` from their start. Starting a level again
/// replaces that learner's unfinished session on the same level.
pub struct SessionRegistry {
    ttl: Duration,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_ttl(Duration::minutes(DEFAULT_SESSION_TTL_MINUTES))
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn insert(&self, session: PlaySession) -> SessionTicket {
        let id = Uuid::new_v4().to_string();
        let entry = SessionEntry {
            user_id: session.user_id().to_string(),
            level_id: session.level_id().to_string(),
            started_at: session.started_at(),
            session: Arc::new(Mutex::new(session)),
        };
        let ticket = SessionTicket {
            id: id.clone(),
            session: Arc::clone(&entry.session),
        };

        let mut sessions = self.sessions.write();
        let before = sessions.len();
        let now = entry.started_at.max(Utc::now());
        sessions.retain(|_, live| {
            !live.expired(self.ttl, now)
                && !(live.user_id == entry.user_id && live.level_id == entry.level_id)
        });
        let dropped = before - sessions.len();
        if dropped > 0 {
            tracing::debug!(dropped, live = sessions.len(), "stale play sessions dropped");
        }
        sessions.insert(id, entry);
        ticket
    }

    pub fn get(&self, user_id: &str, session_id: &str) -> ServiceResult<SessionTicket> {
        let not_found = || ServiceError::SessionNotFound(session_id.to_string());
        let (session, expired) = {
            let sessions = self.sessions.read();
            let entry = sessions.get(session_id).ok_or_else(not_found)?;
            if entry.user_id != user_id {
                tracing::warn!(user_id, session_id, "session lookup by non-owner");
                return Err(not_found());
            }
            (Arc::clone(&entry.session), entry.expired(self.ttl, Utc::now()))
        };

        if expired {
            tracing::debug!(user_id, session_id, "play session expired");
            self.remove(session_id);
            return Err(not_found());
        }

        Ok(SessionTicket {
            id: session_id.to_string(),
            session,
        })
    }

    /// Drop every session older than the ttl; returns how many went
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.expired(self.ttl, now));
        before - sessions.len()
    }

    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
