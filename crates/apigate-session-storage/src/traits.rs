//! Session storage trait and shared types.

use std::collections::HashMap;
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A single HTTP session as seen by the gateway: the ambient `session_id`
/// and RPC `context`, plus a key-value `state` store that holds relay
/// tickets between the two JSONP phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Unique session identifier (UUID v7 for temporal ordering)
    pub session_id: String,
    /// Ambient RPC context (e.g. language, user id) used as the default
    /// `Call.context` when the request carries none
    pub context: HashMap<String, Value>,
    /// Session state key-value store
    pub state: HashMap<String, Value>,
    /// Session creation timestamp (Unix millis)
    pub created_at: u64,
    /// Last activity timestamp (Unix millis)
    pub last_activity: u64,
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionInfo {
    /// Create a new session with UUID v7 for temporal ordering
    pub fn new() -> Self {
        let now = chrono::Utc::now().timestamp_millis() as u64;
        Self {
            session_id: Uuid::now_v7().to_string(),
            context: HashMap::new(),
            state: HashMap::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Create session with a specific ID (session affinity echo, tests)
    pub fn with_id(session_id: String) -> Self {
        Self {
            session_id,
            ..Self::new()
        }
    }

    /// Update last activity timestamp
    pub fn touch(&mut self) {
        self.last_activity = chrono::Utc::now().timestamp_millis() as u64;
    }

    /// Check if session is expired based on timeout
    pub fn is_expired(&self, timeout_minutes: u64) -> bool {
        let now = chrono::Utc::now().timestamp_millis() as u64;
        let timeout_millis = timeout_minutes * 60 * 1000;
        now.saturating_sub(self.last_activity) > timeout_millis
    }
}

/// Core trait for session storage backends.
///
/// Backends must apply state reads/writes atomically per session key:
/// concurrent requests for the same session id may store and pop relay
/// tickets at the same time. Backends also own ticket lifetime — the
/// gateway never cleans tickets up on its own, so bounded per-session
/// storage and eventual expiry are part of this contract.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Error type for storage operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Get the backend name for logging and debugging
    fn backend_name(&self) -> &'static str;

    /// Create a new session with an automatically generated id
    async fn create_session(&self) -> Result<SessionInfo, Self::Error>;

    /// Create a session with a specific id. Used when a cross-origin caller
    /// echoes back a previously issued `session_id` that the backend no
    /// longer knows (and in tests that need predictable ids).
    async fn create_session_with_id(&self, session_id: String)
    -> Result<SessionInfo, Self::Error>;

    /// Get session by ID
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>, Self::Error>;

    /// Update entire session info
    async fn update_session(&self, session_info: SessionInfo) -> Result<(), Self::Error>;

    /// Refresh the session's activity timestamp in place, under the
    /// backend's own lock. Callers must not emulate this with a
    /// read-modify-`update_session` cycle: writing back a whole-session
    /// clone loses state written concurrently for the same session.
    async fn touch_session(&self, session_id: &str) -> Result<(), Self::Error>;

    /// Set a session state value; marks the session as modified
    async fn set_session_state(
        &self,
        session_id: &str,
        key: &str,
        value: Value,
    ) -> Result<(), Self::Error>;

    /// Get a session state value
    async fn get_session_state(
        &self,
        session_id: &str,
        key: &str,
    ) -> Result<Option<Value>, Self::Error>;

    /// Remove and return a session state value (read-once pop)
    async fn remove_session_state(
        &self,
        session_id: &str,
        key: &str,
    ) -> Result<Option<Value>, Self::Error>;

    /// Delete session completely
    async fn delete_session(&self, session_id: &str) -> Result<bool, Self::Error>;

    /// List all session IDs
    async fn list_sessions(&self) -> Result<Vec<String>, Self::Error>;

    /// Remove sessions idle since `older_than` (returns removed ids)
    async fn expire_sessions(&self, older_than: SystemTime) -> Result<Vec<String>, Self::Error>;

    /// Get session count for monitoring
    async fn session_count(&self) -> Result<usize, Self::Error>;

    /// Perform maintenance tasks (compaction, cleanup, etc.)
    async fn maintenance(&self) -> Result<(), Self::Error>;
}

/// Unified error type for session storage backends
#[derive(Debug, thiserror::Error)]
pub enum SessionStorageError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Maximum sessions limit reached: {0}")]
    MaxSessionsReached(usize),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_info_new() {
        let session = SessionInfo::new();
        assert!(!session.session_id.is_empty());
        assert!(session.state.is_empty());
        assert_eq!(session.created_at, session.last_activity);
    }

    #[test]
    fn test_session_touch_advances_activity() {
        let mut session = SessionInfo::with_id("s1".to_string());
        session.last_activity = 0;
        session.touch();
        assert!(session.last_activity > 0);
    }

    #[test]
    fn test_session_expiry() {
        let mut session = SessionInfo::new();
        assert!(!session.is_expired(30));
        session.last_activity = 0;
        assert!(session.is_expired(30));
    }
}
