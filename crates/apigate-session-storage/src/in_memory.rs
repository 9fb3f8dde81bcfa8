//! In-memory session storage.
//!
//! Stores all session data behind an `Arc<RwLock<>>`. Suitable for
//! development, testing and single-instance deployments where session
//! persistence across restarts is not required. The write lock gives the
//! per-session-key atomicity the gateway's relay protocol relies on.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{SessionInfo, SessionStorage, SessionStorageError};

/// Configuration for in-memory session storage
#[derive(Debug, Clone)]
pub struct InMemoryConfig {
    /// Maximum sessions to keep (bounds relay-ticket accumulation too,
    /// since tickets live inside session state)
    pub max_sessions: usize,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            max_sessions: 100_000,
        }
    }
}

/// In-memory storage for gateway sessions
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<RwLock<HashMap<String, SessionInfo>>>,
    config: InMemoryConfig,
}

impl InMemorySessionStorage {
    /// Create new in-memory session storage with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryConfig::default())
    }

    /// Create new in-memory session storage with custom configuration
    pub fn with_config(config: InMemoryConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    fn insert_session(
        sessions: &mut HashMap<String, SessionInfo>,
        session: SessionInfo,
        max_sessions: usize,
    ) -> Result<SessionInfo, SessionStorageError> {
        if sessions.len() >= max_sessions {
            return Err(SessionStorageError::MaxSessionsReached(max_sessions));
        }
        sessions.insert(session.session_id.clone(), session.clone());
        debug!("Created session: {}", session.session_id);
        Ok(session)
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    type Error = SessionStorageError;

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }

    async fn create_session(&self) -> Result<SessionInfo, Self::Error> {
        let mut sessions = self.sessions.write().await;
        Self::insert_session(&mut sessions, SessionInfo::new(), self.config.max_sessions)
    }

    async fn create_session_with_id(
        &self,
        session_id: String,
    ) -> Result<SessionInfo, Self::Error> {
        let mut sessions = self.sessions.write().await;
        Self::insert_session(
            &mut sessions,
            SessionInfo::with_id(session_id),
            self.config.max_sessions,
        )
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>, Self::Error> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn update_session(&self, session_info: SessionInfo) -> Result<(), Self::Error> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_info.session_id.clone(), session_info);
        Ok(())
    }

    async fn touch_session(&self, session_id: &str) -> Result<(), Self::Error> {
        let mut sessions = self.sessions.write().await;

        if let Some(session) = sessions.get_mut(session_id) {
            session.touch();
            Ok(())
        } else {
            Err(SessionStorageError::SessionNotFound(session_id.to_string()))
        }
    }

    async fn set_session_state(
        &self,
        session_id: &str,
        key: &str,
        value: Value,
    ) -> Result<(), Self::Error> {
        let mut sessions = self.sessions.write().await;

        if let Some(session) = sessions.get_mut(session_id) {
            session.state.insert(key.to_string(), value);
            session.touch();
            Ok(())
        } else {
            Err(SessionStorageError::SessionNotFound(session_id.to_string()))
        }
    }

    async fn get_session_state(
        &self,
        session_id: &str,
        key: &str,
    ) -> Result<Option<Value>, Self::Error> {
        let sessions = self.sessions.read().await;

        if let Some(session) = sessions.get(session_id) {
            Ok(session.state.get(key).cloned())
        } else {
            Err(SessionStorageError::SessionNotFound(session_id.to_string()))
        }
    }

    async fn remove_session_state(
        &self,
        session_id: &str,
        key: &str,
    ) -> Result<Option<Value>, Self::Error> {
        let mut sessions = self.sessions.write().await;

        if let Some(session) = sessions.get_mut(session_id) {
            let removed = session.state.remove(key);
            session.touch();
            Ok(removed)
        } else {
            Err(SessionStorageError::SessionNotFound(session_id.to_string()))
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, Self::Error> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(session_id).is_some();
        if removed {
            debug!("Deleted session: {}", session_id);
        }
        Ok(removed)
    }

    async fn list_sessions(&self) -> Result<Vec<String>, Self::Error> {
        let sessions = self.sessions.read().await;
        Ok(sessions.keys().cloned().collect())
    }

    async fn expire_sessions(&self, older_than: SystemTime) -> Result<Vec<String>, Self::Error> {
        let cutoff = older_than
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let mut sessions = self.sessions.write().await;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| session.last_activity < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        for session_id in &expired {
            sessions.remove(session_id);
        }

        if !expired.is_empty() {
            info!("Expired {} idle sessions", expired.len());
        }
        Ok(expired)
    }

    async fn session_count(&self) -> Result<usize, Self::Error> {
        let sessions = self.sessions.read().await;
        Ok(sessions.len())
    }

    async fn maintenance(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_create_and_get_session() {
        let storage = InMemorySessionStorage::new();
        let session = storage.create_session().await.unwrap();

        let fetched = storage.get_session(&session.session_id).await.unwrap();
        assert_eq!(fetched.unwrap().session_id, session.session_id);
        assert_eq!(storage.session_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_state_set_get_remove() {
        let storage = InMemorySessionStorage::new();
        let session = storage.create_session().await.unwrap();
        let sid = session.session_id.as_str();

        storage
            .set_session_state(sid, "jsonp_request_42", json!("{\"params\":{}}"))
            .await
            .unwrap();

        let value = storage.get_session_state(sid, "jsonp_request_42").await.unwrap();
        assert_eq!(value, Some(json!("{\"params\":{}}")));

        // Pop is read-once
        let popped = storage
            .remove_session_state(sid, "jsonp_request_42")
            .await
            .unwrap();
        assert_eq!(popped, Some(json!("{\"params\":{}}")));
        let again = storage
            .remove_session_state(sid, "jsonp_request_42")
            .await
            .unwrap();
        assert_eq!(again, None);
    }

    #[tokio::test]
    async fn test_state_write_touches_session() {
        let storage = InMemorySessionStorage::new();
        let mut session = storage.create_session().await.unwrap();
        session.last_activity = 0;
        storage.update_session(session.clone()).await.unwrap();

        storage
            .set_session_state(&session.session_id, "k", json!(1))
            .await
            .unwrap();
        let updated = storage
            .get_session(&session.session_id)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.last_activity > 0);
    }

    #[tokio::test]
    async fn test_touch_session_in_place() {
        let storage = InMemorySessionStorage::new();
        let mut session = storage.create_session().await.unwrap();
        session.last_activity = 0;
        storage.update_session(session.clone()).await.unwrap();
        let sid = session.session_id.as_str();

        storage.set_session_state(sid, "jsonp_request_1", json!("{}")).await.unwrap();
        storage.touch_session(sid).await.unwrap();

        let updated = storage.get_session(sid).await.unwrap().unwrap();
        assert!(updated.last_activity > 0);
        // The refresh leaves session state alone.
        assert!(updated.state.contains_key("jsonp_request_1"));

        let err = storage.touch_session("ghost").await;
        assert!(matches!(err, Err(SessionStorageError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_session_errors() {
        let storage = InMemorySessionStorage::new();
        let err = storage.set_session_state("ghost", "k", json!(1)).await;
        assert!(matches!(
            err,
            Err(SessionStorageError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_max_sessions_bound() {
        let storage = InMemorySessionStorage::with_config(InMemoryConfig { max_sessions: 1 });
        storage.create_session().await.unwrap();
        let err = storage.create_session().await;
        assert!(matches!(
            err,
            Err(SessionStorageError::MaxSessionsReached(1))
        ));
    }

    #[tokio::test]
    async fn test_expire_sessions() {
        let storage = InMemorySessionStorage::new();
        let mut stale = storage.create_session().await.unwrap();
        stale.last_activity = 0;
        storage.update_session(stale.clone()).await.unwrap();
        let fresh = storage.create_session().await.unwrap();

        let expired = storage
            .expire_sessions(SystemTime::now() - Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(expired, vec![stale.session_id.clone()]);
        assert!(storage.get_session(&stale.session_id).await.unwrap().is_none());
        assert!(storage.get_session(&fresh.session_id).await.unwrap().is_some());
    }
}
