use std::future::Future;
use std::time::Duration;

use review_core::agent_result::AgentResult;
use review_exec::ShutdownSignal;

pub const SHUTDOWN_TIMEOUT_SECONDS: f64 = 3.0;

/// Races an executor future against the shutdown signal. If the executor
/// finishes first, its result is returned directly. If shutdown fires
/// first, the executor is given up to `SHUTDOWN_TIMEOUT_SECONDS` to wind
/// down gracefully; if that grace period also expires, a warning is
/// printed and whatever executor future produced is abandoned in favor
/// of the partial results already collected via `partial`.
pub async fn execute_with_shutdown_timeout<F>(executor: F, shutdown: ShutdownSignal, partial: impl Fn() -> Vec<AgentResult>) -> Vec<AgentResult>
where
    F: Future<Output = Vec<AgentResult>>,
{
    tokio::pin!(executor);
    let mut shutdown_watcher = shutdown;

    tokio::select! {
        results = &mut executor => results,
        _ = wait_for_shutdown(&mut shutdown_watcher) => {
            match tokio::time::timeout(Duration::from_secs_f64(SHUTDOWN_TIMEOUT_SECONDS), &mut executor).await {
                Ok(results) => results,
                Err(_elapsed) => {
                    let collected = partial();
                    eprintln!(
                        "Warning: Shutdown timeout ({SHUTDOWN_TIMEOUT_SECONDS}s) expired, returning {} partial result(s)",
                        collected.len()
                    );
                    collected
                }
            }
        }
    }
}

async fn wait_for_shutdown(shutdown: &mut ShutdownSignal) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
