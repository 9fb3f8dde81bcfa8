//! The exception-to-wire-error translation table.
//!
//! Every dispatcher failure maps to a fixed `(code, message, http_status)`
//! tuple. Routine conditions (not-found, session failures, user-facing
//! warnings) are deliberately kept out of the error log; only unexpected
//! failures are logged at error severity before mapping.

use tracing::error;

use apigate_json_rpc::{DispatchError, ErrorRecord};

/// Map a dispatcher failure into the stable wire error contract. First
/// match wins; anything not in the table becomes a generic server error.
pub fn map_failure(failure: &DispatchError, request_path: &str) -> ErrorRecord {
    if !failure.is_expected() {
        error!(
            "Exception during JSON request handling at {}: {}",
            request_path, failure
        );
    }

    let record = match failure {
        DispatchError::NotFound(_) => ErrorRecord::not_found(),
        DispatchError::AuthenticationFailed(_) => ErrorRecord::session_invalid(),
        DispatchError::SessionExpired(_) => ErrorRecord::session_expired(),
        DispatchError::UserFacing(_) | DispatchError::Internal { .. } => {
            ErrorRecord::server_error()
        }
    };

    record.with_data(failure.serialize_failure())
}
