pub mod aggregator;
pub mod backend;
pub mod context;
pub mod runner;
pub mod selector;

pub use aggregator::{build_aggregator_message, run_aggregator, AggregatorBackend};
pub use backend::{AgentBackend, BackendError, BackendOutcome};
pub use context::{build_execution_context, AgentExecutionContext};
pub use runner::run_agent;
pub use selector::{build_prefetch_guardrail, resolve_selected_agents, run_selector, ReferencedContent, SelectorBackend, SelectorExecutionContext, SelectorOutput};
