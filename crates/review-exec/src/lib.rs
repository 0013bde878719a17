use std::sync::{Arc, Mutex};

use review_agent::{run_agent, AgentBackend, AgentExecutionContext};
use review_core::agent_result::AgentResult;
use review_core::phase::group_by_phase;

pub type ShutdownSignal = tokio::sync::watch::Receiver<bool>;

/// Shared sink both executors append each finished agent's result to as
/// it completes, so a caller racing the executor against a timeout (see
/// `review-engine`'s shutdown wrapper) can read out whatever has been
/// collected so far even if the executor future itself gets abandoned.
pub type ResultSink = Arc<Mutex<Vec<AgentResult>>>;

pub fn new_result_sink() -> ResultSink {
    Arc::new(Mutex::new(Vec::new()))
}

/// Reads out a clone of whatever `sink` currently holds. Used as the
/// `partial` fallback when an executor is abandoned mid-run.
pub fn drain_sink(sink: &ResultSink) -> Vec<AgentResult> {
    sink.lock().map(|guard| guard.clone()).unwrap_or_default()
}

fn record(sink: &ResultSink, result: AgentResult) -> AgentResult {
    if let Ok(mut guard) = sink.lock() {
        guard.push(result.clone());
    }
    result
}

fn is_set(shutdown: &ShutdownSignal) -> bool {
    *shutdown.borrow()
}

/// Runs every context phase by phase, name-sorted within a phase,
/// checking the shutdown signal before each agent. On shutdown, whatever
/// has already been collected is returned and remaining agents (in the
/// current and any later phase) are skipped. Each result is also mirrored
/// into `sink` as it completes.
pub async fn execute_sequential(
    contexts: Vec<AgentExecutionContext>,
    backend: Arc<dyn AgentBackend>,
    shutdown: &ShutdownSignal,
    sink: &ResultSink,
) -> Vec<AgentResult> {
    let grouped = group_by_phase(contexts, |c| c.phase, |c| c.agent_name.as_str());
    let mut results = Vec::new();
    for (_, group) in grouped {
        if is_set(shutdown) {
            break;
        }
        for ctx in group {
            if is_set(shutdown) {
                break;
            }
            results.push(record(sink, run_agent(&ctx, backend.as_ref()).await));
        }
    }
    results
}

/// Runs each phase's contexts concurrently via a join set, phases in
/// fixed order. A shutdown mid-phase aborts whatever in that phase's
/// join set hasn't completed yet, keeps whatever already finished, and
/// skips every later phase entirely. Each result is also mirrored into
/// `sink` as it completes.
pub async fn execute_parallel(
    contexts: Vec<AgentExecutionContext>,
    backend: Arc<dyn AgentBackend>,
    shutdown: &ShutdownSignal,
    sink: &ResultSink,
) -> Vec<AgentResult> {
    let grouped = group_by_phase(contexts, |c| c.phase, |c| c.agent_name.as_str());
    let mut results = Vec::new();

    for (_, group) in grouped {
        if is_set(shutdown) {
            break;
        }

        let mut join_set = tokio::task::JoinSet::new();
        for ctx in group {
            let backend = Arc::clone(&backend);
            join_set.spawn(async move { run_agent(&ctx, backend.as_ref()).await });
        }

        let mut shutdown_watcher = shutdown.clone();
        loop {
            tokio::select! {
                joined = join_set.join_next() => {
                    match joined {
                        Some(Ok(result)) => results.push(record(sink, result)),
                        Some(Err(_join_error)) => {}
                        None => break,
                    }
                }
                changed = shutdown_watcher.changed() => {
                    if changed.is_ok() && *shutdown_watcher.borrow() {
                        join_set.abort_all();
                        while join_set.join_next().await.is_some() {}
                        return results;
                    }
                }
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_agent::{AgentExecutionContext, BackendError, BackendOutcome};
    use review_core::phase::Phase;
    use review_tools::catalog::ResolvedTools;
    use std::time::Duration;

    struct InstantBackend;
    #[async_trait::async_trait]
    impl AgentBackend for InstantBackend {
        async fn run(&self, _ctx: &AgentExecutionContext) -> Result<BackendOutcome, BackendError> {
            Ok(BackendOutcome::Completed { issues: vec![], cost: None })
        }
    }

    fn ctx(name: &str, phase: Phase) -> AgentExecutionContext {
        AgentExecutionContext {
            agent_name: name.to_string(),
            model: "anthropic:x".to_string(),
            system_prompt: "p".to_string(),
            user_message: "m".to_string(),
            tools: ResolvedTools::default(),
            timeout_seconds: 5.0,
            max_turns: 10,
            phase,
        }
    }

    #[tokio::test]
    async fn sequential_runs_all_contexts_when_no_shutdown() {
        let (_tx, rx) = tokio::sync::watch::channel(false);
        let contexts = vec![ctx("a", Phase::Early), ctx("b", Phase::Main)];
        let sink = new_result_sink();
        let results = execute_sequential(contexts, Arc::new(InstantBackend), &rx, &sink).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn sequential_stops_when_shutdown_already_set() {
        let (_tx, rx) = tokio::sync::watch::channel(true);
        let contexts = vec![ctx("a", Phase::Early)];
        let sink = new_result_sink();
        let results = execute_sequential(contexts, Arc::new(InstantBackend), &rx, &sink).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn parallel_runs_all_contexts_when_no_shutdown() {
        let (_tx, rx) = tokio::sync::watch::channel(false);
        let contexts = vec![ctx("a", Phase::Early), ctx("b", Phase::Early), ctx("c", Phase::Main)];
        let sink = new_result_sink();
        let results = execute_parallel(contexts, Arc::new(InstantBackend), &rx, &sink).await;
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn parallel_skips_later_phases_once_shutdown_fires() {
        struct SlowBackend;
        #[async_trait::async_trait]
        impl AgentBackend for SlowBackend {
            async fn run(&self, _ctx: &AgentExecutionContext) -> Result<BackendOutcome, BackendError> {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(BackendOutcome::Completed { issues: vec![], cost: None })
            }
        }
        let (tx, rx) = tokio::sync::watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let _ = tx.send(true);
        });
        let contexts = vec![ctx("a", Phase::Early), ctx("b", Phase::Main)];
        let sink = new_result_sink();
        let results = execute_parallel(contexts, Arc::new(SlowBackend), &rx, &sink).await;
        assert!(results.len() <= 1);
    }

    #[tokio::test]
    async fn sink_mirrors_results_as_they_complete() {
        let (_tx, rx) = tokio::sync::watch::channel(false);
        let contexts = vec![ctx("a", Phase::Early), ctx("b", Phase::Main)];
        let sink = new_result_sink();
        let results = execute_sequential(contexts, Arc::new(InstantBackend), &rx, &sink).await;
        assert_eq!(drain_sink(&sink).len(), results.len());
    }
}
