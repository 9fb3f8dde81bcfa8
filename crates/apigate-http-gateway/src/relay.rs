//! Two-phase JSONP relay.
//!
//! Browsers without native cross-origin POST split one RPC call into two
//! round-trips: phase 1 POSTs the raw request text and gets the correlation
//! id echoed back; phase 2 GETs with that id, which pops the stored ticket
//! and runs the call. Single-trip variants carry the request inline (`r`
//! query parameter) or in the body as usual.

use hyper::Method;
use serde_json::Value;
use tracing::debug;

use apigate_session_storage::SessionStorage;

use crate::query::QueryParams;

/// Fallback request text when a ticket is missing, expired or already
/// consumed: decodes to an empty, harmless call rather than an error.
pub const EMPTY_REQUEST: &str = "{}";

const TICKET_PREFIX: &str = "jsonp_request_";

/// Session-state key for the relay ticket of a correlation id.
pub fn ticket_key(request_id: &str) -> String {
    format!("{}{}", TICKET_PREFIX, request_id)
}

/// How the raw request text reaches the gateway for one HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMode {
    /// Phase-1 POST: store the ticket and short-circuit before decoding
    Store { id: String },
    /// Single-trip GET with the raw request inline in `r`
    Inline { raw: String },
    /// Phase-2 GET: pop the stored ticket for `id`
    Stored { id: String },
    /// Plain JSON-RPC: raw request text is the HTTP body
    Direct,
}

impl RelayMode {
    /// Classify a request from its HTTP method and query parameters.
    /// `jsonp` is the relay's on switch; without it everything is Direct.
    pub fn classify(method: &Method, query: &QueryParams) -> Self {
        if query.get("jsonp").is_none() {
            return RelayMode::Direct;
        }
        if method == Method::POST {
            return RelayMode::Store {
                id: query.get("id").unwrap_or_default().to_string(),
            };
        }
        if let Some(raw) = query.get("r") {
            return RelayMode::Inline {
                raw: raw.to_string(),
            };
        }
        if let Some(id) = query.get("id") {
            return RelayMode::Stored { id: id.to_string() };
        }
        RelayMode::Direct
    }
}

/// Phase 1: write the raw request text under the correlation id. The state
/// write marks the session as modified, which forces persistence in
/// session-backed stores.
pub async fn store_ticket<S: SessionStorage>(
    storage: &S,
    session_id: &str,
    request_id: &str,
    payload: String,
) -> Result<(), S::Error> {
    debug!(
        "Storing relay ticket: session={}, id={}",
        session_id, request_id
    );
    storage
        .set_session_state(session_id, &ticket_key(request_id), Value::String(payload))
        .await
}

/// Phase 2: pop (read-once) the ticket. Missing, expired or already
/// consumed tickets fall back to [`EMPTY_REQUEST`].
pub async fn take_ticket<S: SessionStorage>(
    storage: &S,
    session_id: &str,
    request_id: &str,
) -> Result<String, S::Error> {
    let ticket = storage
        .remove_session_state(session_id, &ticket_key(request_id))
        .await?;
    Ok(match ticket {
        Some(Value::String(payload)) => payload,
        Some(other) => other.to_string(),
        None => {
            debug!(
                "No relay ticket for session={}, id={}; dispatching empty call",
                session_id, request_id
            );
            EMPTY_REQUEST.to_string()
        }
    })
}
