//! Role gate and server-side sessions.
//!
//! Logging in as `admin` requires the shared admin secret. Any other role
//! string is accepted as `user` without a password check.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Dashboard a freshly logged-in session is sent to.
    pub fn dashboard(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::User => "/user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Wrong Admin Password!")]
    WrongAdminPassword,
}

/// Session information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(role: Role, ttl: Duration) -> Self {
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session);
    async fn get(&self, id: &str) -> Option<Session>;
    async fn delete(&self, id: &str);
    /// Drop every session expired at `now`; returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

/// In-memory implementation of SessionStorage
#[derive(Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    async fn delete(&self, id: &str) {
        self.sessions.remove(id);
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        before.saturating_sub(self.sessions.len())
    }
}

/// Decide the role for a login attempt without touching any session.
pub fn resolve_role(
    role: Option<&str>,
    password: Option<&str>,
    admin_password: &str,
) -> Result<Role, AuthError> {
    if role != Some(ADMIN_ROLE) {
        return Ok(Role::User);
    }
    if password == Some(admin_password) {
        Ok(Role::Admin)
    } else {
        Err(AuthError::WrongAdminPassword)
    }
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    pub redirect_to: &'static str,
}

#[derive(Clone)]
pub struct RoleGate {
    admin_password: Arc<str>,
    session_ttl: Duration,
    storage: Arc<dyn SessionStorage>,
}

impl RoleGate {
    pub fn new(
        admin_password: impl Into<String>,
        session_ttl: Duration,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        Self {
            admin_password: Arc::from(admin_password.into()),
            session_ttl,
            storage,
        }
    }

    /// Check the credentials and open a session for the resulting role.
    /// A rejected admin login creates no session. Expired sessions are
    /// swept before the new one is stored.
    pub async fn authenticate(
        &self,
        role: Option<&str>,
        password: Option<&str>,
    ) -> Result<LoginOutcome, AuthError> {
        let role = resolve_role(role, password, &self.admin_password).inspect_err(|_| {
            warn!("admin login rejected");
        })?;

        let purged = self.storage.purge_expired(Utc::now()).await;
        if purged > 0 {
            debug!(purged, "expired sessions removed");
        }

        let session = Session::new(role, self.session_ttl);
        self.storage.save(session.clone()).await;
        info!(session_id = %session.id, ?role, "session opened");

        Ok(LoginOutcome {
            redirect_to: role.dashboard(),
            session,
        })
    }

    /// Live session for `id`. Expired sessions are evicted and reported as
    /// absent.
    pub async fn session(&self, id: &str) -> Option<Session> {
        let session = self.storage.get(id).await?;
        if session.is_expired(Utc::now()) {
            debug!(session_id = %id, "session expired");
            self.storage.delete(id).await;
            return None;
        }
        Some(session)
    }
}
