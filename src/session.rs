/// Session Registry
///
/// Tracks one live session per refresh-token identity `(user_id, issued_at)`.
/// Sessions are created by login, touched by refresh and removed by explicit
/// deletion only. Nothing here expires sessions; a session whose refresh
/// token has expired stays listable and revocable until deleted.
///
/// The registry holds no lock of its own. Share it behind a
/// `parking_lot::RwLock`: lookups and listings take the read side, `create`,
/// `touch` and `delete` the write side.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{RefreshPayload, TokenPayload};
use crate::clock::Clock;
use crate::error::SessionError;
use crate::repository::Repository;

/// Identity key of a refresh token. `issued_at` is compared by exact instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshIdentity {
    pub user_id: String,
    #[serde(rename = "issuedAtTime")]
    pub issued_at: DateTime<Utc>,
}

impl RefreshIdentity {
    pub fn new(user_id: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            issued_at,
        }
    }
}

impl From<&RefreshPayload> for RefreshIdentity {
    fn from(payload: &RefreshPayload) -> Self {
        Self::new(payload.user_id(), payload.issued_at())
    }
}

/// Where a session was opened from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceData {
    pub ip_address: String,
    pub user_agent: String,
}

/// One live refresh-token grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Handle used to address the session for revocation; unrelated to the token
    pub id: Uuid,
    pub refresh_identity: RefreshIdentity,
    pub device_data: DeviceData,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.refresh_identity.user_id
    }
}

pub struct SessionRegistry {
    sessions: Repository<RefreshIdentity, Session>,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Repository::new(|session: &Session| session.refresh_identity.clone()),
            clock,
        }
    }

    pub fn find_by_identity(&self, identity: &RefreshIdentity) -> Result<&Session, SessionError> {
        self.sessions.get(identity).ok_or(SessionError::NotFound)
    }

    pub fn find_by_id(&self, id: &Uuid) -> Result<&Session, SessionError> {
        self.sessions
            .find(|session| session.id == *id)
            .ok_or(SessionError::NotFound)
    }

    /// Snapshot of every session, in no particular order
    pub fn list_all(&self) -> Vec<Session> {
        self.sessions.iter().cloned().collect()
    }

    /// Snapshot of the sessions owned by `user_id`, in no particular order
    pub fn list_for_user(&self, user_id: &str) -> Vec<Session> {
        self.sessions
            .iter()
            .filter(|session| session.user_id() == user_id)
            .cloned()
            .collect()
    }

    /// Register a new session for `identity`.
    ///
    /// `last_activity` starts at the identity's `issued_at`.
    ///
    /// # Errors
    /// `SessionError::AlreadyExists` if a session with this identity is
    /// already registered; the existing session is left untouched
    pub fn create(
        &mut self,
        identity: RefreshIdentity,
        device_data: DeviceData,
    ) -> Result<Uuid, SessionError> {
        let session = Session {
            id: Uuid::new_v4(),
            last_activity: identity.issued_at,
            refresh_identity: identity,
            device_data,
        };

        let id = session.id;
        self.sessions
            .insert(session)
            .map_err(|_| SessionError::AlreadyExists)?;

        tracing::debug!(session_id = %id, "Session registered");
        Ok(id)
    }

    /// Mark `session` as active now. Returns the new `last_activity`.
    ///
    /// # Errors
    /// `SessionError::NotFound` if the session was deleted since it was read
    pub fn touch(&mut self, session: &Session) -> Result<DateTime<Utc>, SessionError> {
        let now = self.clock.now();
        let stored = self
            .sessions
            .get_mut(&session.refresh_identity)
            .ok_or(SessionError::NotFound)?;

        stored.last_activity = now.max(stored.last_activity);
        Ok(stored.last_activity)
    }

    /// Remove the session bound to `identity` and return it.
    pub fn delete(&mut self, identity: &RefreshIdentity) -> Result<Session, SessionError> {
        self.sessions.remove(identity).ok_or(SessionError::NotFound)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
