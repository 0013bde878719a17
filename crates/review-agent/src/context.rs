use review_config::{AgentConfig, Config};
use review_core::agent_def::AgentDefinition;
use review_core::error::ToolPolicyError;
use review_core::phase::Phase;
use review_tools::catalog::{resolve_tools, ResolvedTools};

#[derive(Debug, Clone)]
pub struct AgentExecutionContext {
    pub agent_name: String,
    pub model: String,
    pub system_prompt: String,
    pub user_message: String,
    pub tools: ResolvedTools,
    pub timeout_seconds: f64,
    pub max_turns: u32,
    pub phase: Phase,
}

/// `agent_config` takes precedence over `agent_def`, which takes
/// precedence over `global`. `model` only ever resolves across two
/// layers (`agent_config` then `agent_def`) because `AgentDefinition.model`
/// is mandatory and there is no sensible third fallback; `timeout` and
/// `max_turns` resolve across all three because both `agent_def` and
/// `global` carry optional/defaulted values for them.
fn resolve_with_agent_def<T: Clone>(agent_config_value: Option<T>, agent_def_value: Option<T>, global_value: T) -> T {
    agent_config_value.or(agent_def_value).unwrap_or(global_value)
}

pub fn build_execution_context(
    agent_def: &AgentDefinition,
    agent_config: Option<&AgentConfig>,
    global: &Config,
    user_message: String,
) -> Result<AgentExecutionContext, ToolPolicyError> {
    let model = agent_config
        .and_then(|c| c.model.clone())
        .unwrap_or_else(|| agent_def.model.clone());

    let timeout_seconds = resolve_with_agent_def(agent_config.and_then(|c| c.timeout), agent_def.timeout, global.timeout);

    let max_turns = resolve_with_agent_def(agent_config.and_then(|c| c.max_turns), agent_def.max_turns, global.max_turns);

    let tools = resolve_tools(&agent_def.allowed_tools)?;

    Ok(AgentExecutionContext {
        agent_name: agent_def.name.clone(),
        model,
        system_prompt: agent_def.system_prompt.clone(),
        user_message,
        tools,
        timeout_seconds,
        max_turns,
        phase: agent_def.phase,
    })
}
