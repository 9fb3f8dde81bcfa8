//! HTTP gateway server with pluggable session storage.
//!
//! The server owns the accept loop, routes the configured gateway path to
//! the dispatch shell, applies CORS, and runs the session expiry sweep on
//! behalf of the storage backend. The gateway handler itself spawns no
//! background work.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use apigate_json_rpc::Dispatcher;
use apigate_session_storage::{InMemorySessionStorage, SessionStorage};

use crate::{CorsLayer, GatewayHandler, MemoryProbe, Result};

/// Configuration for the HTTP gateway server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path for the RPC endpoint
    pub gateway_path: String,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size
    pub max_body_size: usize,
    /// Session expiry time in minutes
    pub session_expiry_minutes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".parse().unwrap(),
            gateway_path: "/gateway".to_string(),
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
            session_expiry_minutes: 30,
        }
    }
}

/// Builder for the gateway server with pluggable storage
pub struct GatewayServerBuilder<S: SessionStorage = InMemorySessionStorage> {
    config: ServerConfig,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    storage: Arc<S>,
    memory_probe: Option<Arc<dyn MemoryProbe>>,
}

impl GatewayServerBuilder<InMemorySessionStorage> {
    /// Create a new builder with in-memory storage (zero-configuration)
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            dispatcher: None,
            storage: Arc::new(InMemorySessionStorage::new()),
            memory_probe: None,
        }
    }
}

impl Default for GatewayServerBuilder<InMemorySessionStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SessionStorage + 'static> GatewayServerBuilder<S> {
    /// Create a new builder with specific session storage
    pub fn with_storage(storage: Arc<S>) -> Self {
        Self {
            config: ServerConfig::default(),
            dispatcher: None,
            storage,
            memory_probe: None,
        }
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the RPC endpoint path
    pub fn gateway_path(mut self, path: impl Into<String>) -> Self {
        self.config.gateway_path = path.into();
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Set session expiry time in minutes
    pub fn session_expiry_minutes(mut self, minutes: u64) -> Self {
        self.config.session_expiry_minutes = minutes;
        self
    }

    /// Set the method dispatcher the gateway forwards calls to
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Attach a process memory probe for RPC instrumentation
    pub fn memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.memory_probe = Some(probe);
        self
    }

    /// Build the gateway server
    pub fn build(self) -> GatewayServer<S> {
        let dispatcher = self.dispatcher.expect("Dispatcher must be provided");

        let mut handler = GatewayHandler::new(self.config.clone(), dispatcher, self.storage.clone());
        if let Some(probe) = self.memory_probe {
            handler = handler.with_memory_probe(probe);
        }

        GatewayServer {
            config: self.config,
            handler,
            storage: self.storage,
        }
    }
}

/// HTTP gateway server
pub struct GatewayServer<S: SessionStorage = InMemorySessionStorage> {
    config: ServerConfig,
    handler: GatewayHandler<S>,
    storage: Arc<S>,
}

impl GatewayServer<InMemorySessionStorage> {
    /// Create a new builder with default in-memory storage
    pub fn builder() -> GatewayServerBuilder<InMemorySessionStorage> {
        GatewayServerBuilder::new()
    }
}

impl<S: SessionStorage + 'static> GatewayServer<S> {
    /// Create a new builder with specific session storage
    pub fn builder_with_storage(storage: Arc<S>) -> GatewayServerBuilder<S> {
        GatewayServerBuilder::with_storage(storage)
    }

    /// Run the server
    pub async fn run(&self) -> Result<()> {
        self.start_session_cleanup();

        let listener = TcpListener::bind(&self.config.bind_address).await?;
        info!("HTTP gateway listening on {}", self.config.bind_address);
        info!("RPC endpoint available at: {}", self.config.gateway_path);
        info!("Session storage: {}", self.storage.backend_name());

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service =
                    service_fn(move |req| handle_connection(req, handler.clone()));

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    let err_str = err.to_string();
                    if err_str.contains("connection closed before message completed") {
                        debug!("Client disconnected (normal): {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }

    /// Background session expiry sweep, fulfilling the storage contract
    /// that idle sessions (and the relay tickets inside them) eventually go
    /// away.
    fn start_session_cleanup(&self) {
        let storage = Arc::clone(&self.storage);
        let session_expiry_minutes = self.config.session_expiry_minutes;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
            loop {
                interval.tick().await;

                let expire_time = std::time::SystemTime::now()
                    - std::time::Duration::from_secs(session_expiry_minutes * 60);
                match storage.expire_sessions(expire_time).await {
                    Ok(expired) => {
                        for session_id in expired {
                            debug!("Expired session: {}", session_id);
                        }
                    }
                    Err(err) => {
                        error!("Session cleanup error: {}", err);
                    }
                }
            }
        });
    }
}

/// Route one connection-level request through the gateway handler
async fn handle_connection<S: SessionStorage + 'static>(
    req: Request<hyper::body::Incoming>,
    handler: GatewayHandler<S>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    debug!("Handling {} {}", req.method(), path);

    let response = if path == handler.config.gateway_path {
        match handler.handle_request(req).await {
            Ok(response) => response,
            Err(err) => {
                error!("Request handling error: {}", err);
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Full::new(Bytes::from("Internal Server Error")))
                    .unwrap()
            }
        }
    } else {
        Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not Found")))
            .unwrap()
    };

    let mut response = response;
    if handler.config.enable_cors {
        CorsLayer::apply_cors_headers(response.headers_mut());
    }
    Ok(response)
}
