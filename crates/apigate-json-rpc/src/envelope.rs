use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::types::{JsonRpcVersion, RequestId};

/// The decoded client payload. Decoding is deliberately permissive: the
/// version tag is not validated, `params` defaults to an empty object and
/// `method`/`id` are carried through untouched, whatever their JSON type.
/// Only `params` is consumed by the gateway itself.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Envelope {
    #[serde(rename = "jsonrpc", default)]
    pub version: JsonRpcVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Value>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl Envelope {
    /// Parse a raw JSON request text into an envelope.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(raw).map_err(|err| DecodeError::invalid_json(raw, err))
    }

    /// Parse raw request bytes, rejecting non-UTF-8 bodies as a transport
    /// error rather than a wire error.
    pub fn decode_bytes(raw: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(raw)?;
        Self::decode(text)
    }
}
