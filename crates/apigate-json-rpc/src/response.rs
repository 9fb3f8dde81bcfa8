use serde::Serialize;
use serde_json::Value;

use crate::error::ErrorRecord;
use crate::types::JsonRpcVersion;
use crate::{MIME_JAVASCRIPT, MIME_JSON};

/// The outbound response envelope. Exactly one of `result`/`error` is
/// populated; `status` mirrors the inner result's HTTP status and is only
/// present on success. `session_id` is injected in JSONP mode so that
/// cross-origin callers without cookie access can echo it back to keep
/// session affinity.
#[derive(Debug, Clone, Serialize)]
pub struct WireResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl WireResponse {
    /// Build a success response carrying the dispatcher's result.
    pub fn success(result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            status: Some(200),
            result: Some(result),
            error: None,
            session_id: None,
        }
    }

    /// Build a failure response from a mapped error record.
    pub fn failure(error: ErrorRecord) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            status: None,
            result: None,
            error: Some(error),
            session_id: None,
        }
    }

    /// HTTP status for this response: the error record's status (default
    /// 200) on failure, 200 on success.
    pub fn http_status(&self) -> u16 {
        self.error.as_ref().map(|e| e.http_status).unwrap_or(200)
    }

    /// Serialize to a body and content type. With a JSONP callback the JSON
    /// is wrapped as `callback(<json>);`, served under a script MIME type,
    /// and the session id is written into the body.
    pub fn render(
        mut self,
        jsonp_callback: Option<&str>,
        session_id: &str,
    ) -> Result<(String, &'static str), serde_json::Error> {
        match jsonp_callback {
            Some(callback) => {
                self.session_id = Some(session_id.to_string());
                let json = serde_json::to_string(&self)?;
                Ok((format!("{}({});", callback, json), MIME_JAVASCRIPT))
            }
            None => {
                let json = serde_json::to_string(&self)?;
                Ok((json, MIME_JSON))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let (body, mime) = WireResponse::success(json!(["alice", "bob"]))
            .render(None, "sid")
            .unwrap();
        assert_eq!(mime, MIME_JSON);
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["status"], 200);
        assert_eq!(value["result"], json!(["alice", "bob"]));
        assert!(value.get("error").is_none());
        // Plain responses never leak the session id.
        assert!(value.get("session_id").is_none());
    }

    #[test]
    fn test_failure_shape() {
        let response = WireResponse::failure(ErrorRecord::not_found());
        assert_eq!(response.http_status(), 404);
        let (body, _) = response.render(None, "sid").unwrap();
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["error"]["code"], 404);
        assert!(value.get("result").is_none());
        assert!(value.get("status").is_none());
        assert!(value["error"].get("http_status").is_none());
    }

    #[test]
    fn test_jsonp_wrapping() {
        let (body, mime) = WireResponse::success(json!(1))
            .render(Some("cb"), "abc123")
            .unwrap();
        assert_eq!(mime, MIME_JAVASCRIPT);
        assert!(body.starts_with("cb("));
        assert!(body.ends_with(");"));
        let inner: Value = serde_json::from_str(&body[3..body.len() - 2]).unwrap();
        assert_eq!(inner["session_id"], "abc123");
        assert_eq!(inner["result"], 1);
    }

    #[test]
    fn test_http_status_defaults() {
        assert_eq!(WireResponse::success(json!(null)).http_status(), 200);
        let expired = WireResponse::failure(ErrorRecord::session_expired());
        assert_eq!(expired.http_status(), 200);
    }
}
