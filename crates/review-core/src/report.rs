use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::agent_result::{AgentResult, CostInfo};
use crate::exit_code::ExitCode;
use crate::review::ReviewIssue;
use crate::severity::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub description: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentFailure {
    pub agent_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub issues: Vec<ReviewIssue>,
    pub strengths: Vec<String>,
    pub recommended_actions: Vec<RecommendedAction>,
    pub agent_failures: Vec<AgentFailure>,
}

/// `max_severity` and `total_issues` are kept consistent by construction:
/// zero issues implies no max, one or more implies a max. Build through
/// `ReviewSummary::new` rather than constructing the struct literal
/// directly to preserve that invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSummary {
    total_issues: usize,
    max_severity: Option<Severity>,
    pub total_elapsed_time: f64,
    pub total_cost: Option<f64>,
}

impl ReviewSummary {
    pub fn new(issues: &[ReviewIssue], total_elapsed_time: f64, total_cost: Option<f64>) -> Self {
        let max_severity = issues.iter().map(|i| i.severity).max();
        ReviewSummary {
            total_issues: issues.len(),
            max_severity,
            total_elapsed_time,
            total_cost,
        }
    }

    pub fn total_issues(&self) -> usize {
        self.total_issues
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.max_severity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewReport {
    pub results: Vec<AgentResult>,
    pub summary: ReviewSummary,
    pub load_errors: Vec<String>,
    pub aggregated: Option<AggregatedReport>,
    pub aggregation_error: Option<String>,
}

impl ReviewReport {
    /// Collects issues from valid (Success/Truncated) results only.
    pub fn collect_issues(results: &[AgentResult]) -> Vec<ReviewIssue> {
        results
            .iter()
            .filter(|r| r.is_valid())
            .flat_map(|r| r.issues().to_vec())
            .collect()
    }

    /// None unless at least one Success result carries cost info; when
    /// present, sums input/output tokens across cost-bearing Success
    /// results only (Truncated results never carry cost).
    pub fn aggregate_cost(results: &[AgentResult]) -> Option<CostInfo> {
        let mut any = false;
        let mut input_tokens = 0u64;
        let mut output_tokens = 0u64;
        let mut total_cost = 0.0f64;
        let mut has_total_cost = false;
        for result in results {
            if let AgentResult::Success { cost: Some(cost), .. } = result {
                any = true;
                input_tokens += cost.input_tokens;
                output_tokens += cost.output_tokens;
                if let Some(c) = cost.total_cost {
                    has_total_cost = true;
                    total_cost += c;
                }
            }
        }
        if !any {
            return None;
        }
        Some(CostInfo {
            input_tokens,
            output_tokens,
            total_cost: has_total_cost.then_some(total_cost),
        })
    }

    pub fn total_elapsed(results: &[AgentResult]) -> f64 {
        results.iter().filter_map(|r| r.elapsed_time()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct EngineResult {
    pub report: ReviewReport,
    pub exit_code: ExitCode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_issues_has_no_max_severity() {
        let summary = ReviewSummary::new(&[], 0.0, None);
        assert_eq!(summary.total_issues(), 0);
        assert_eq!(summary.max_severity(), None);
    }

    #[test]
    fn nonempty_issues_has_max_severity() {
        let issues = vec![ReviewIssue {
            agent_name: "a".to_string(),
            severity: Severity::Important,
            description: "d".to_string(),
            location: None,
            suggestion: None,
            category: None,
        }];
        let summary = ReviewSummary::new(&issues, 1.0, None);
        assert_eq!(summary.total_issues(), 1);
        assert_eq!(summary.max_severity(), Some(Severity::Important));
    }

    #[test]
    fn cost_aggregation_ignores_truncated_and_costless_success() {
        let results = vec![
            AgentResult::Success {
                agent_name: "a".to_string(),
                issues: vec![],
                elapsed_time: 1.0,
                cost: None,
            },
            AgentResult::Truncated {
                agent_name: "b".to_string(),
                issues: vec![],
                elapsed_time: 1.0,
                turns_consumed: 30,
            },
        ];
        assert!(ReviewReport::aggregate_cost(&results).is_none());
    }
}
