//! Optional RPC timing and memory instrumentation.
//!
//! Emits one request-side line before dispatch and one timing line after,
//! both on the dedicated `apigate::rpc` target and only when that target is
//! enabled at DEBUG. Memory figures come from an optional process probe.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

/// Log target for RPC request/response diagnostics.
pub const RPC_TARGET: &str = "apigate::rpc";

/// Process memory snapshot probe. Implementations typically read RSS from
/// the OS; absent a probe, memory figures are reported as zero.
pub trait MemoryProbe: Send + Sync {
    /// Current process memory use, in bytes.
    fn snapshot(&self) -> u64;
}

/// Whether RPC diagnostics are being collected for this process.
pub fn rpc_trace_enabled() -> bool {
    tracing::enabled!(target: RPC_TARGET, tracing::Level::DEBUG)
}

/// Start/stop pair around one dispatcher invocation.
pub struct RpcTimer {
    started: Instant,
    start_memory: u64,
}

impl RpcTimer {
    pub fn start(probe: Option<&Arc<dyn MemoryProbe>>) -> Self {
        Self {
            started: Instant::now(),
            start_memory: probe.map(|p| p.snapshot()).unwrap_or(0),
        }
    }

    /// Emit the timing line for a completed call.
    pub fn finish(self, probe: Option<&Arc<dyn MemoryProbe>>, target: &str, method: &str) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let end_memory = probe.map(|p| p.snapshot()).unwrap_or(0);
        debug!(
            target: RPC_TARGET,
            "{} {}: time:{:.3}s mem: {}k -> {}k (diff: {}k)",
            target,
            method,
            elapsed,
            self.start_memory / 1024,
            end_memory / 1024,
            (end_memory as i64 - self.start_memory as i64) / 1024,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(u64);

    impl MemoryProbe for FixedProbe {
        fn snapshot(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn test_timer_without_probe() {
        let timer = RpcTimer::start(None);
        assert_eq!(timer.start_memory, 0);
        timer.finish(None, "user", "list");
    }

    #[test]
    fn test_timer_reads_probe() {
        let probe: Arc<dyn MemoryProbe> = Arc::new(FixedProbe(2048));
        let timer = RpcTimer::start(Some(&probe));
        assert_eq!(timer.start_memory, 2048);
        timer.finish(Some(&probe), "user", "list");
    }
}
