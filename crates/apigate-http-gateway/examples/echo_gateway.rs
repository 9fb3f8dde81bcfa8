//! Minimal gateway over a toy dispatcher.
//!
//! Run with `RUST_LOG=debug,apigate::rpc=debug cargo run --example
//! echo_gateway`, then:
//!
//! ```text
//! curl -d '{"jsonrpc":"2.0","params":{"target":"user","method":"list","args":[]}}' \
//!     http://127.0.0.1:8000/gateway
//! ```

use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::EnvFilter;

use apigate_http_gateway::{DispatchError, GatewayServer};
use apigate_json_rpc::FnDispatcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dispatcher = Arc::new(FnDispatcher::new(|target, method, args, context| {
        match (target, method) {
            ("user", "list") => Ok(json!(["alice", "bob"])),
            ("echo", "args") => Ok(json!({ "args": args, "context": context })),
            _ => Err(DispatchError::NotFound(format!("{}.{}", target, method))),
        }
    }));

    let server = GatewayServer::builder()
        .bind_address("127.0.0.1:8000".parse()?)
        .dispatcher(dispatcher)
        .build();

    server.run().await?;
    Ok(())
}
