use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A client-supplied correlation ID for a JSON-RPC request. Usually a
/// string or an integer, but anything the client sent is carried through
/// untouched; the gateway never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Other(Value),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Other(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

impl RequestId {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestId::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RequestId::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// JSON-RPC version tag. Only written on encode; decode is permissive and
/// tolerates any (or no) version string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonRpcVersion::V2_0 => "2.0",
        }
    }
}

impl fmt::Display for JsonRpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Accept whatever the client sent; the gateway never rejects on version.
        let _ = serde::de::IgnoredAny::deserialize(deserializer)?;
        Ok(JsonRpcVersion::V2_0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId::Number(42).to_string(), "42");
        assert_eq!(RequestId::String("abc".into()).to_string(), "abc");
    }

    #[test]
    fn test_request_id_untagged() {
        let n: RequestId = serde_json::from_str("7").unwrap();
        assert_eq!(n, RequestId::Number(7));
        let s: RequestId = serde_json::from_str("\"r1\"").unwrap();
        assert_eq!(s, RequestId::String("r1".to_string()));
        // Non-integer ids are carried through, not rejected.
        let f: RequestId = serde_json::from_str("1.5").unwrap();
        assert!(matches!(f, RequestId::Other(_)));
        assert_eq!(f.to_string(), "1.5");
    }

    #[test]
    fn test_version_accepts_any_value() {
        let v: JsonRpcVersion = serde_json::from_str("\"1.0\"").unwrap();
        assert_eq!(v, JsonRpcVersion::V2_0);
        let v: JsonRpcVersion = serde_json::from_str("2").unwrap();
        assert_eq!(v, JsonRpcVersion::V2_0);
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"2.0\"");
    }
}
