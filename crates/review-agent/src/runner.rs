use std::time::{Duration, Instant};

use review_core::agent_result::AgentResult;

use crate::backend::{AgentBackend, BackendError, BackendOutcome};
use crate::context::AgentExecutionContext;

/// Runs one agent to completion, mapping every outcome into an
/// `AgentResult` that never propagates as a Rust error — a single
/// agent's failure must never poison the rest of a review run.
///
/// The cancel-scope race is handled explicitly: if the backend reports a
/// cleanup error but had already produced a result, the result wins and
/// the cleanup error is only logged; the error only surfaces as
/// `AgentResult::Error` when no result was ever observed.
pub async fn run_agent(ctx: &AgentExecutionContext, backend: &dyn AgentBackend) -> AgentResult {
    let started = Instant::now();
    let timeout = Duration::from_secs_f64(ctx.timeout_seconds.max(0.0));

    match tokio::time::timeout(timeout, backend.run(ctx)).await {
        Err(_elapsed) => AgentResult::Timeout {
            agent_name: ctx.agent_name.clone(),
            timeout_seconds: ctx.timeout_seconds,
        },
        Ok(Ok(outcome)) => outcome_to_result(ctx, outcome, started.elapsed()),
        Ok(Err(BackendError::CancelScopeRace { observed: Some(outcome) })) => {
            tracing::warn!(agent = %ctx.agent_name, "cancel scope error after result observed; returning observed result");
            outcome_to_result(ctx, *outcome, started.elapsed())
        }
        Ok(Err(BackendError::CancelScopeRace { observed: None })) => AgentResult::Error {
            agent_name: ctx.agent_name.clone(),
            error_message: "agent run did not produce a result".to_string(),
            exit_code: None,
            error_type: Some("cancel_scope_race".to_string()),
            stderr: None,
        },
        Ok(Err(BackendError::Failed {
            message,
            exit_code,
            error_type,
            stderr,
        })) => AgentResult::Error {
            agent_name: ctx.agent_name.clone(),
            error_message: message,
            exit_code,
            error_type,
            stderr,
        },
    }
}

fn outcome_to_result(ctx: &AgentExecutionContext, outcome: BackendOutcome, elapsed: Duration) -> AgentResult {
    match outcome {
        BackendOutcome::Completed { issues, cost } => AgentResult::Success {
            agent_name: ctx.agent_name.clone(),
            issues,
            elapsed_time: elapsed.as_secs_f64(),
            cost,
        },
        BackendOutcome::Truncated { partial_issues, turns_consumed } => AgentResult::Truncated {
            agent_name: ctx.agent_name.clone(),
            issues: partial_issues,
            elapsed_time: elapsed.as_secs_f64(),
            turns_consumed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_core::phase::Phase;
    use review_tools::catalog::ResolvedTools;

    struct StubBackend(Result<BackendOutcome, BackendError>);

    #[async_trait::async_trait]
    impl AgentBackend for StubBackend {
        async fn run(&self, _ctx: &AgentExecutionContext) -> Result<BackendOutcome, BackendError> {
            match &self.0 {
                Ok(BackendOutcome::Completed { issues, cost }) => Ok(BackendOutcome::Completed {
                    issues: issues.clone(),
                    cost: cost.clone(),
                }),
                Ok(BackendOutcome::Truncated { partial_issues, turns_consumed }) => Ok(BackendOutcome::Truncated {
                    partial_issues: partial_issues.clone(),
                    turns_consumed: *turns_consumed,
                }),
                Err(BackendError::CancelScopeRace { observed: None }) => Err(BackendError::CancelScopeRace { observed: None }),
                Err(BackendError::CancelScopeRace { observed: Some(outcome) }) => Err(BackendError::CancelScopeRace {
                    observed: Some(Box::new((**outcome).clone())),
                }),
                Err(BackendError::Failed { message, exit_code, error_type, stderr }) => Err(BackendError::Failed {
                    message: message.clone(),
                    exit_code: *exit_code,
                    error_type: error_type.clone(),
                    stderr: stderr.clone(),
                }),
            }
        }
    }

    fn sample_ctx() -> AgentExecutionContext {
        AgentExecutionContext {
            agent_name: "style".to_string(),
            model: "anthropic:x".to_string(),
            system_prompt: "p".to_string(),
            user_message: "m".to_string(),
            tools: ResolvedTools::default(),
            timeout_seconds: 5.0,
            max_turns: 10,
            phase: Phase::Main,
        }
    }

    #[tokio::test]
    async fn success_outcome_becomes_success_result() {
        let backend = StubBackend(Ok(BackendOutcome::Completed { issues: vec![], cost: None }));
        let result = run_agent(&sample_ctx(), &backend).await;
        assert!(matches!(result, AgentResult::Success { .. }));
    }

    #[tokio::test]
    async fn cancel_scope_race_with_observed_result_returns_that_result() {
        let backend = StubBackend(Err(BackendError::CancelScopeRace {
            observed: Some(Box::new(BackendOutcome::Completed { issues: vec![], cost: None })),
        }));
        let result = run_agent(&sample_ctx(), &backend).await;
        assert!(matches!(result, AgentResult::Success { .. }));
    }

    #[tokio::test]
    async fn cancel_scope_race_without_observed_result_errors() {
        let backend = StubBackend(Err(BackendError::CancelScopeRace { observed: None }));
        let result = run_agent(&sample_ctx(), &backend).await;
        assert!(matches!(result, AgentResult::Error { .. }));
    }

    #[tokio::test]
    async fn timeout_elapsed_becomes_timeout_result() {
        struct HangingBackend;
        #[async_trait::async_trait]
        impl AgentBackend for HangingBackend {
            async fn run(&self, _ctx: &AgentExecutionContext) -> Result<BackendOutcome, BackendError> {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(BackendOutcome::Completed { issues: vec![], cost: None })
            }
        }
        let mut ctx = sample_ctx();
        ctx.timeout_seconds = 0.01;
        let result = run_agent(&ctx, &HangingBackend).await;
        assert!(matches!(result, AgentResult::Timeout { .. }));
    }
}
