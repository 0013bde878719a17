use review_agent::backend::{AgentBackend, BackendError, BackendOutcome};
use review_agent::context::AgentExecutionContext;
use review_agent::{AggregatorBackend, SelectorBackend, SelectorExecutionContext, SelectorOutput};
use review_core::report::AggregatedReport;

/// Stand-in for a real model adapter. Wiring this crate to an actual LLM
/// client is explicitly out of scope here — the engine only ever talks to
/// the `AgentBackend`/`SelectorBackend`/`AggregatorBackend` traits, so a
/// real client can be dropped in later without touching the pipeline.
pub struct UnconfiguredBackend;

#[async_trait::async_trait]
impl AgentBackend for UnconfiguredBackend {
    async fn run(&self, ctx: &AgentExecutionContext) -> Result<BackendOutcome, BackendError> {
        Err(BackendError::Failed {
            message: format!("no model backend configured for agent '{}'", ctx.agent_name),
            exit_code: None,
            error_type: Some("no_backend".to_string()),
            stderr: None,
        })
    }
}

#[async_trait::async_trait]
impl SelectorBackend for UnconfiguredBackend {
    async fn run(&self, _ctx: &SelectorExecutionContext) -> Result<SelectorOutput, String> {
        Err("no model backend configured for the selector".to_string())
    }
}

#[async_trait::async_trait]
impl AggregatorBackend for UnconfiguredBackend {
    async fn run(&self, _model: &str, _system_prompt: &str, _message: &str, _max_turns: u32) -> Result<AggregatedReport, String> {
        Err("no model backend configured for the aggregator".to_string())
    }
}
