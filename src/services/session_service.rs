use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::telegram_user::AuthenticatedIdentity;
use crate::utils::{time, token::generate_session_token};

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub identity: AuthenticatedIdentity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-memory cache of validated launches, keyed by bearer token.
#[derive(Clone)]
pub struct SessionService {
    ttl_secs: u64,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionService {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs: ttl_secs.max(1),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn create(&self, identity: AuthenticatedIdentity) -> (String, Session) {
        self.create_at(identity, time::now())
    }

    fn create_at(&self, identity: AuthenticatedIdentity, now: DateTime<Utc>) -> (String, Session) {
        let token = generate_session_token();
        let session = Session {
            identity,
            issued_at: now,
            expires_at: time::add_seconds(now, self.ttl_secs),
        };
        self.write().insert(token.clone(), session.clone());
        (token, session)
    }

    pub fn get(&self, token: &str) -> Option<Session> {
        self.get_at(token, time::now())
    }

    fn get_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let session = self.read().get(token).cloned()?;
        if session.is_expired(now) {
            self.write().remove(token);
            return None;
        }
        Some(session)
    }

    /// Logout. Returns whether a live session was removed.
    pub fn revoke(&self, token: &str) -> bool {
        let now = time::now();
        self.write()
            .remove(token)
            .is_some_and(|s| !s.is_expired(now))
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(time::now())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::telegram_user::WebAppUser;
    use chrono::Duration;

    fn identity(id: i64) -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            user: Some(WebAppUser {
                id,
                first_name: "Ann".into(),
                last_name: None,
                username: None,
                photo_url: None,
                is_premium: None,
                language_code: None,
                is_bot: None,
                allows_write_to_pm: None,
            }),
            receiver: None,
            chat: None,
            query_id: None,
            chat_type: None,
            chat_instance: None,
            start_param: None,
            can_send_after: None,
            auth_date: Utc::now(),
            signature_hex: "ab".into(),
        }
    }

    #[test]
    fn created_session_is_retrievable() {
        let sessions = SessionService::new(60);
        let (token, session) = sessions.create(identity(1));
        assert_eq!(session.expires_at - session.issued_at, Duration::seconds(60));
        let found = sessions.get(&token).unwrap();
        assert_eq!(found.identity.user_id(), Some(1));
        assert!(sessions.get("unknown").is_none());
    }

    #[test]
    fn expired_session_is_evicted_on_read() {
        let sessions = SessionService::new(60);
        let now = Utc::now();
        let (token, _) = sessions.create_at(identity(1), now);
        assert!(sessions.get_at(&token, now + Duration::seconds(59)).is_some());
        assert!(sessions.get_at(&token, now + Duration::seconds(60)).is_none());
        assert!(sessions.is_empty());
    }

    #[test]
    fn revoke_is_one_shot() {
        let sessions = SessionService::new(60);
        let (token, _) = sessions.create(identity(2));
        assert!(sessions.revoke(&token));
        assert!(!sessions.revoke(&token));
        assert!(sessions.get(&token).is_none());
    }

    #[test]
    fn purge_drops_only_expired() {
        let sessions = SessionService::new(60);
        let now = Utc::now();
        sessions.create_at(identity(1), now - Duration::seconds(120));
        sessions.create_at(identity(2), now);
        assert_eq!(sessions.purge_expired_at(now), 1);
        assert_eq!(sessions.len(), 1);
    }
}
