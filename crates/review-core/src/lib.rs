pub mod agent_def;
pub mod agent_result;
pub mod error;
pub mod exit_code;
pub mod phase;
pub mod report;
pub mod review;
pub mod severity;
pub mod target;

pub use agent_def::{AgentDefinition, AggregatorDefinition, ApplicabilityRule, LoadError, LoadResult, SelectorDefinition};
pub use agent_result::{AgentResult, CostInfo};
pub use exit_code::ExitCode;
pub use phase::{Phase, PHASE_SEQUENCE};
pub use report::{AgentFailure, AggregatedReport, EngineResult, Priority, RecommendedAction, ReviewReport, ReviewSummary};
pub use review::{FileLocation, ReviewIssue};
pub use severity::Severity;
pub use target::ReviewTarget;
