use review_core::agent_result::CostInfo;
use review_core::review::ReviewIssue;

use crate::context::AgentExecutionContext;

/// What a model-adapter call produced, independent of how long it took.
/// The timeout budget is enforced by the caller (`run_agent`), not by
/// the backend itself.
#[derive(Debug, Clone)]
pub enum BackendOutcome {
    Completed {
        issues: Vec<ReviewIssue>,
        cost: Option<CostInfo>,
    },
    /// The turn budget (`max_turns`) was exhausted before the model
    /// finished. Per the documented truncation behavior, a backend that
    /// cannot recover partial findings from an interrupted run should
    /// return an empty `partial_issues` rather than guessing.
    Truncated {
        partial_issues: Vec<ReviewIssue>,
        turns_consumed: u32,
    },
}

/// A model-adapter failure. `CancelScopeRace` models the specific known
/// failure mode where the adapter's async cleanup path raises after a
/// result may already have been produced — `observed` carries that result
/// if one was captured before the cleanup error fired.
#[derive(Debug)]
pub enum BackendError {
    CancelScopeRace { observed: Option<Box<BackendOutcome>> },
    Failed {
        message: String,
        exit_code: Option<i32>,
        error_type: Option<String>,
        stderr: Option<String>,
    },
}

#[async_trait::async_trait]
pub trait AgentBackend: Send + Sync {
    async fn run(&self, ctx: &AgentExecutionContext) -> Result<BackendOutcome, BackendError>;
}
