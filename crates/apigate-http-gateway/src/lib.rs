//! # HTTP JSON-RPC Gateway
//!
//! HTTP shell around an application-supplied [`Dispatcher`]: accepts
//! JSON-RPC 2.0 style requests over POST/GET, normalizes them into a
//! uniform [`Call`](normalize::Call), invokes the dispatcher and renders
//! the result (or a mapped wire error) back as JSON.
//!
//! ## Features
//! - Two-phase JSONP bridge for browsers without cross-origin POST
//! - Stable exception-to-wire-error translation table
//! - Session affinity via echoed session ids for cookie-less callers
//! - CORS support for browser-based clients
//! - Optional RPC timing/memory instrumentation

pub mod cors;
pub mod error_map;
pub mod handler;
pub mod instrument;
pub mod normalize;
pub mod query;
pub mod relay;
pub mod server;

// Re-export main types
pub use cors::CorsLayer;
pub use handler::GatewayHandler;
pub use instrument::{MemoryProbe, RPC_TARGET};
pub use normalize::Call;
pub use query::QueryParams;
pub use relay::RelayMode;
pub use server::{GatewayServer, GatewayServerBuilder, ServerConfig};

// Re-export foundational types
pub use apigate_json_rpc::{DispatchError, Dispatcher, Envelope, ErrorRecord, WireResponse};
pub use apigate_session_storage::{InMemorySessionStorage, SessionInfo, SessionStorage};

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Gateway-internal errors. These never reach the wire body; the server
/// shell turns them into a bare 500.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session storage error: {0}")]
    Storage(String),
}

impl GatewayError {
    pub(crate) fn storage(err: impl std::error::Error) -> Self {
        GatewayError::Storage(err.to_string())
    }
}
