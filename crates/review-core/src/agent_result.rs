use serde::{Deserialize, Serialize};

use crate::review::ReviewIssue;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostInfo {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: Option<f64>,
}

/// Outcome of running a single agent. Mirrors the agent's lifecycle:
/// it either produced issues, was cut short by the turn budget, timed
/// out, or errored before producing anything usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AgentResult {
    Success {
        agent_name: String,
        issues: Vec<ReviewIssue>,
        elapsed_time: f64,
        cost: Option<CostInfo>,
    },
    Truncated {
        agent_name: String,
        issues: Vec<ReviewIssue>,
        elapsed_time: f64,
        turns_consumed: u32,
    },
    Timeout {
        agent_name: String,
        timeout_seconds: f64,
    },
    Error {
        agent_name: String,
        error_message: String,
        exit_code: Option<i32>,
        error_type: Option<String>,
        stderr: Option<String>,
    },
}

impl AgentResult {
    pub fn agent_name(&self) -> &str {
        match self {
            AgentResult::Success { agent_name, .. }
            | AgentResult::Truncated { agent_name, .. }
            | AgentResult::Timeout { agent_name, .. }
            | AgentResult::Error { agent_name, .. } => agent_name,
        }
    }

    /// Success and Truncated results carry usable issues and count toward
    /// elapsed-time and cost aggregation; Timeout and Error do not.
    pub fn is_valid(&self) -> bool {
        matches!(self, AgentResult::Success { .. } | AgentResult::Truncated { .. })
    }

    pub fn issues(&self) -> &[ReviewIssue] {
        match self {
            AgentResult::Success { issues, .. } | AgentResult::Truncated { issues, .. } => issues,
            AgentResult::Timeout { .. } | AgentResult::Error { .. } => &[],
        }
    }

    pub fn elapsed_time(&self) -> Option<f64> {
        match self {
            AgentResult::Success { elapsed_time, .. } | AgentResult::Truncated { elapsed_time, .. } => Some(*elapsed_time),
            AgentResult::Timeout { .. } | AgentResult::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_has_no_cost_field() {
        let result = AgentResult::Truncated {
            agent_name: "style".to_string(),
            issues: vec![],
            elapsed_time: 1.0,
            turns_consumed: 30,
        };
        assert!(result.is_valid());
    }

    #[test]
    fn timeout_and_error_are_not_valid() {
        let timeout = AgentResult::Timeout {
            agent_name: "slow".to_string(),
            timeout_seconds: 600.0,
        };
        let error = AgentResult::Error {
            agent_name: "broken".to_string(),
            error_message: "boom".to_string(),
            exit_code: None,
            error_type: None,
            stderr: None,
        };
        assert!(!timeout.is_valid());
        assert!(!error.is_valid());
        assert!(timeout.issues().is_empty());
        assert!(error.issues().is_empty());
    }
}
