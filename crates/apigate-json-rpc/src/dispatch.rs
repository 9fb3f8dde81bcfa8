use serde_json::{Map, Value, json};

use async_trait::async_trait;
use thiserror::Error;

/// Failure taxonomy of the external dispatcher, checked by discriminant by
/// the gateway's error mapper. `UserFacing` covers expected, routine
/// conditions that must not reach the error log.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("session expired: {0}")]
    SessionExpired(String),

    #[error("{0}")]
    UserFacing(String),

    #[error("{message}")]
    Internal {
        message: String,
        trace: Option<String>,
    },
}

impl DispatchError {
    pub fn internal(message: impl Into<String>) -> Self {
        DispatchError::Internal {
            message: message.into(),
            trace: None,
        }
    }

    pub fn internal_with_trace(message: impl Into<String>, trace: impl Into<String>) -> Self {
        DispatchError::Internal {
            message: message.into(),
            trace: Some(trace.into()),
        }
    }

    /// Variant name carried in the wire diagnostic payload.
    pub fn name(&self) -> &'static str {
        match self {
            DispatchError::NotFound(_) => "NotFound",
            DispatchError::AuthenticationFailed(_) => "AuthenticationFailed",
            DispatchError::SessionExpired(_) => "SessionExpired",
            DispatchError::UserFacing(_) => "UserFacing",
            DispatchError::Internal { .. } => "Internal",
        }
    }

    /// Whether this failure is a routine, user-facing condition that is
    /// suppressed from the error log.
    pub fn is_expected(&self) -> bool {
        !matches!(self, DispatchError::Internal { .. })
    }

    /// Serialized diagnostic representation for the wire `data` field.
    /// The trace is attached only for unexpected failures.
    pub fn serialize_failure(&self) -> Value {
        let mut data = json!({
            "name": self.name(),
            "message": self.to_string(),
        });
        if let DispatchError::Internal {
            trace: Some(trace), ..
        } = self
        {
            data["debug"] = json!(trace);
        }
        data
    }
}

/// The external method executor. Resolution of `target`/`method` strings to
/// actual code is entirely the implementor's concern; the gateway forwards
/// whatever the normalizer produced and propagates any failure unchanged to
/// its error mapper.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn invoke(
        &self,
        target: &str,
        method: &str,
        args: Vec<Value>,
        context: Map<String, Value>,
    ) -> Result<Value, DispatchError>;
}

/// A closure-backed dispatcher for tests and small embeddings.
pub struct FnDispatcher<F>
where
    F: Fn(&str, &str, Vec<Value>, Map<String, Value>) -> Result<Value, DispatchError>
        + Send
        + Sync,
{
    invoke_fn: F,
}

impl<F> FnDispatcher<F>
where
    F: Fn(&str, &str, Vec<Value>, Map<String, Value>) -> Result<Value, DispatchError>
        + Send
        + Sync,
{
    pub fn new(invoke_fn: F) -> Self {
        Self { invoke_fn }
    }
}

#[async_trait]
impl<F> Dispatcher for FnDispatcher<F>
where
    F: Fn(&str, &str, Vec<Value>, Map<String, Value>) -> Result<Value, DispatchError>
        + Send
        + Sync,
{
    async fn invoke(
        &self,
        target: &str,
        method: &str,
        args: Vec<Value>,
        context: Map<String, Value>,
    ) -> Result<Value, DispatchError> {
        (self.invoke_fn)(target, method, args, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_failures() {
        assert!(DispatchError::NotFound("user".into()).is_expected());
        assert!(DispatchError::SessionExpired("sid".into()).is_expected());
        assert!(DispatchError::UserFacing("quota reached".into()).is_expected());
        assert!(!DispatchError::internal("boom").is_expected());
    }

    #[test]
    fn test_serialize_failure_trace_only_for_internal() {
        let data = DispatchError::internal_with_trace("boom", "at dispatch.rs:1")
            .serialize_failure();
        assert_eq!(data["name"], "Internal");
        assert_eq!(data["debug"], "at dispatch.rs:1");

        let data = DispatchError::NotFound("user".into()).serialize_failure();
        assert_eq!(data["name"], "NotFound");
        assert!(data.get("debug").is_none());
    }

    #[tokio::test]
    async fn test_fn_dispatcher() {
        let dispatcher = FnDispatcher::new(|target, method, args, _context| {
            if target == "user" && method == "count" {
                Ok(json!(args.len()))
            } else {
                Err(DispatchError::NotFound(format!("{}.{}", target, method)))
            }
        });

        let result = dispatcher
            .invoke("user", "count", vec![json!(1), json!(2)], Map::new())
            .await
            .unwrap();
        assert_eq!(result, json!(2));

        let err = dispatcher
            .invoke("ghost", "list", vec![], Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
    }
}
