use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::error_codes;

/// Transport-level decode failure. Raised before the gateway's own error
/// mapping applies and surfaces as an HTTP 400, never as a wire error body.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON data: {snippet}")]
    InvalidJson {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request body is not valid UTF-8")]
    InvalidEncoding(#[from] std::str::Utf8Error),
}

impl DecodeError {
    /// Capture a bounded sample of the offending payload for the log line.
    pub(crate) fn invalid_json(raw: &str, source: serde_json::Error) -> Self {
        let mut snippet: String = raw.chars().take(120).collect();
        if snippet.len() < raw.len() {
            snippet.push_str("...");
        }
        DecodeError::InvalidJson { snippet, source }
    }
}

/// The stable `(code, message, data, http_status)` error contract written to
/// the wire. `http_status` steers the HTTP response only and is stripped from
/// the serialized body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip)]
    pub http_status: u16,
}

impl ErrorRecord {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            http_status: 200,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = status;
        self
    }

    pub fn not_found() -> Self {
        Self::new(error_codes::NOT_FOUND, "Not Found").with_http_status(404)
    }

    pub fn session_invalid() -> Self {
        Self::new(error_codes::SESSION, "Session Invalid")
    }

    pub fn session_expired() -> Self {
        Self::new(error_codes::SESSION, "Session Expired")
    }

    pub fn server_error() -> Self {
        Self::new(error_codes::SERVER_ERROR, "Server Error")
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire error {}: {}", self.code, self.message)
    }
}
