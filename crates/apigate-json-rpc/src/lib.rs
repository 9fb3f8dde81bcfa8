//! # JSON-RPC 2.0 Wire Codec
//!
//! A pure, transport-agnostic JSON-RPC 2.0 codec for the apigate gateway.
//! This crate provides the envelope/response types and the dispatcher seam
//! without any transport-specific code.
//!
//! ## Features
//! - Permissive request decoding (missing `jsonrpc`/`params` tolerated)
//! - Response encoding with optional JSONP wrapping and session-id injection
//! - Stable wire error contract via [`ErrorRecord`]
//! - Typed failure taxonomy via [`DispatchError`]

pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod response;
pub mod types;

// Re-export main types
pub use dispatch::{DispatchError, Dispatcher, FnDispatcher};
pub use envelope::Envelope;
pub use error::{DecodeError, ErrorRecord};
pub use response::WireResponse;
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Wire error codes of the gateway contract
pub mod error_codes {
    /// Authentication failure or expired session
    pub const SESSION: i64 = 100;
    /// Any uncaught server-side failure
    pub const SERVER_ERROR: i64 = 200;
    /// Target/route not found
    pub const NOT_FOUND: i64 = 404;
}

/// MIME type for plain JSON responses
pub const MIME_JSON: &str = "application/json";
/// MIME type for JSONP (script) responses
pub const MIME_JAVASCRIPT: &str = "application/javascript";
