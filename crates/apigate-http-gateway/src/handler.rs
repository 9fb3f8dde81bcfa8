//! HTTP request handler: the gateway's dispatch shell.
//!
//! One handler instance serves all requests. Per request it resolves the
//! session, runs the JSONP relay state machine, decodes and normalizes the
//! envelope, invokes the external dispatcher and renders the outcome.
//! Every code path returns a response; no failure escapes uncaught except
//! the transport-level decode error, which becomes a bare HTTP 400.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use tracing::{debug, error, info, warn};

use apigate_json_rpc::{Dispatcher, Envelope, WireResponse};
use apigate_session_storage::{InMemorySessionStorage, SessionInfo, SessionStorage};

use crate::error_map::map_failure;
use crate::instrument::{self, MemoryProbe, RPC_TARGET, RpcTimer};
use crate::normalize::Call;
use crate::query::{QueryParams, parse_form};
use crate::relay::{self, RelayMode};
use crate::{GatewayError, Result, ServerConfig};

/// Header carrying the session id for non-JSONP cross-origin callers.
/// JSONP callers echo the id via the `session_id` query parameter instead,
/// since script-tag requests cannot set headers.
pub const SESSION_ID_HEADER: &str = "Gateway-Session-Id";

/// Extract the echoed session id from request headers
pub fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// HTTP handler for gateway RPC requests
pub struct GatewayHandler<S: SessionStorage = InMemorySessionStorage> {
    pub(crate) config: ServerConfig,
    pub(crate) dispatcher: Arc<dyn Dispatcher>,
    pub(crate) storage: Arc<S>,
    pub(crate) memory_probe: Option<Arc<dyn MemoryProbe>>,
}

impl<S: SessionStorage + 'static> Clone for GatewayHandler<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
            storage: Arc::clone(&self.storage),
            memory_probe: self.memory_probe.clone(),
        }
    }
}

impl<S: SessionStorage + 'static> GatewayHandler<S> {
    /// Create a new handler
    pub fn new(config: ServerConfig, dispatcher: Arc<dyn Dispatcher>, storage: Arc<S>) -> Self {
        Self {
            config,
            dispatcher,
            storage,
            memory_probe: None,
        }
    }

    /// Attach a process memory probe for RPC instrumentation
    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.memory_probe = Some(probe);
        self
    }

    /// Handle one gateway HTTP request
    pub async fn handle_request<B>(&self, req: Request<B>) -> Result<Response<Full<Bytes>>>
    where
        B: http_body::Body + Send,
        B::Data: Send,
        B::Error: std::fmt::Display,
    {
        match req.method() {
            &Method::POST | &Method::GET => self.handle_rpc(req).await,
            &Method::OPTIONS => Ok(self.handle_preflight()),
            _ => Ok(self.method_not_allowed()),
        }
    }

    async fn handle_rpc<B>(&self, req: Request<B>) -> Result<Response<Full<Bytes>>>
    where
        B: http_body::Body + Send,
        B::Data: Send,
        B::Error: std::fmt::Display,
    {
        let path = req.uri().path().to_string();
        let query = QueryParams::parse(req.uri().query().unwrap_or(""));
        let http_method = req.method().clone();

        // `jsonp` doubles as the relay switch and the response callback name
        let jsonp = query.get("jsonp").map(str::to_string);
        let requested_session = query
            .get("session_id")
            .map(str::to_string)
            .or_else(|| extract_session_id(req.headers()));

        let body_bytes = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                error!("Failed to read request body: {}", err);
                return Ok(plain_response(
                    StatusCode::BAD_REQUEST,
                    "Failed to read request body",
                ));
            }
        };

        if body_bytes.len() > self.config.max_body_size {
            warn!("Request body too large: {} bytes", body_bytes.len());
            return Ok(plain_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large",
            ));
        }

        let session = self.resolve_session(requested_session).await?;
        let session_id = session.session_id;
        let session_context = session.context;
        // In-place refresh: a whole-session write-back here would clobber
        // relay tickets stored concurrently for the same session.
        self.storage
            .touch_session(&session_id)
            .await
            .map_err(GatewayError::storage)?;

        let raw = match RelayMode::classify(&http_method, &query) {
            RelayMode::Store { id } => {
                // Phase 1 short-circuits before any decoding or dispatch
                let form = parse_form(&String::from_utf8_lossy(&body_bytes));
                let payload = form.get("r").unwrap_or_default().to_string();
                relay::store_ticket(self.storage.as_ref(), &session_id, &id, payload)
                    .await
                    .map_err(GatewayError::storage)?;
                return Ok(store_phase_response(&id));
            }
            RelayMode::Inline { raw } => raw,
            RelayMode::Stored { id } => {
                relay::take_ticket(self.storage.as_ref(), &session_id, &id)
                    .await
                    .map_err(GatewayError::storage)?
            }
            RelayMode::Direct => match std::str::from_utf8(&body_bytes) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    info!("{}: request body is not valid UTF-8", path);
                    return Ok(plain_response(
                        StatusCode::BAD_REQUEST,
                        "Request body must be valid UTF-8",
                    ));
                }
            },
        };

        let envelope = match Envelope::decode(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                // Transport-level failure: 400 without touching the dispatcher
                info!("{}: {}", path, err);
                return Ok(plain_response(StatusCode::BAD_REQUEST, "Invalid JSON data"));
            }
        };

        let call = Call::from_envelope(envelope, &session_context);

        let trace_rpc = instrument::rpc_trace_enabled();
        let timer = trace_rpc.then(|| RpcTimer::start(self.memory_probe.as_ref()));
        if trace_rpc {
            debug!(
                target: RPC_TARGET,
                "{}: {} {} {:?}",
                path, call.target, call.method, call.args
            );
        }

        let outcome = self
            .dispatcher
            .invoke(&call.target, &call.method, call.args, call.context)
            .await;

        let wire = match outcome {
            Ok(result) => {
                if let Some(timer) = timer {
                    timer.finish(self.memory_probe.as_ref(), &call.target, &call.method);
                }
                WireResponse::success(result)
            }
            Err(failure) => WireResponse::failure(map_failure(&failure, &path)),
        };

        let http_status = wire.http_status();
        let (body, mime) = wire.render(jsonp.as_deref(), &session_id)?;

        Ok(Response::builder()
            .status(http_status)
            .header(CONTENT_TYPE, mime)
            .body(Full::new(Bytes::from(body)))
            .unwrap())
    }

    /// Resolve the request's session: an echoed id wins, an unknown echoed
    /// id is re-materialized to keep affinity across backend restarts, and
    /// a request with no id gets a fresh session.
    async fn resolve_session(&self, requested: Option<String>) -> Result<SessionInfo> {
        match requested {
            Some(session_id) => {
                match self
                    .storage
                    .get_session(&session_id)
                    .await
                    .map_err(GatewayError::storage)?
                {
                    Some(session) => Ok(session),
                    None => self
                        .storage
                        .create_session_with_id(session_id)
                        .await
                        .map_err(GatewayError::storage),
                }
            }
            None => self
                .storage
                .create_session()
                .await
                .map_err(GatewayError::storage),
        }
    }

    /// Handle OPTIONS preflight requests
    fn handle_preflight(&self) -> Response<Full<Bytes>> {
        let mut response = Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::new()))
            .unwrap();
        crate::CorsLayer::apply_cors_headers(response.headers_mut());
        response
    }

    /// Return method not allowed response
    fn method_not_allowed(&self) -> Response<Full<Bytes>> {
        Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header("Allow", "POST, GET, OPTIONS")
            .body(Full::new(Bytes::from("Method not allowed")))
            .unwrap()
    }
}

/// Phase-1 response: the correlation id as plain text
fn store_phase_response(request_id: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(request_id.to_string())))
        .unwrap()
}

fn plain_response(status: StatusCode, message: impl Into<String>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(message.into())))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apigate_json_rpc::{DispatchError, FnDispatcher};
    use serde_json::json;

    fn test_handler() -> GatewayHandler<InMemorySessionStorage> {
        let dispatcher = Arc::new(FnDispatcher::new(|_, _, _, _| {
            Err(DispatchError::NotFound("nothing here".into()))
        }));
        GatewayHandler::new(
            ServerConfig::default(),
            dispatcher,
            Arc::new(InMemorySessionStorage::new()),
        )
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let handler = test_handler();
        let req = Request::builder()
            .method(Method::DELETE)
            .uri("/gateway")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = handler.handle_request(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_preflight_carries_cors_headers() {
        let handler = test_handler();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/gateway")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = handler.handle_request(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("Access-Control-Allow-Origin"));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut handler = test_handler();
        handler.config.max_body_size = 8;
        let req = Request::builder()
            .method(Method::POST)
            .uri("/gateway")
            .body(Full::new(Bytes::from(vec![b'x'; 64])))
            .unwrap();
        let response = handler.handle_request(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_extract_session_id() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_ID_HEADER, "abc-123".parse().unwrap());
        assert_eq!(extract_session_id(&headers), Some("abc-123".to_string()));
        assert_eq!(extract_session_id(&HeaderMap::new()), None);
    }
}
