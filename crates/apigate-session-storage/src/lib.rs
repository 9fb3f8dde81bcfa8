//! Session storage for the apigate gateway.
//!
//! The gateway itself holds no session state: it reads the ambient session
//! id and context, stores JSONP relay tickets into the session's key-value
//! state and relies on the backend for persistence, atomicity per session
//! key and eventual expiry. This crate provides that collaborator contract
//! ([`SessionStorage`]) and an in-memory backend for development, testing
//! and single-instance deployments.

pub mod in_memory;
pub mod traits;

pub use in_memory::{InMemoryConfig, InMemorySessionStorage};
pub use traits::{SessionInfo, SessionStorage, SessionStorageError};
