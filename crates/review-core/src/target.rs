use serde::{Deserialize, Serialize};

/// What a review run is asked to look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ReviewTarget {
    Diff {
        base_branch: String,
        issue_number: Option<u64>,
    },
    Pr {
        pr_number: u64,
        issue_number: Option<u64>,
    },
    File {
        paths: Vec<String>,
        issue_number: Option<u64>,
    },
}

impl ReviewTarget {
    pub fn issue_number(&self) -> Option<u64> {
        match self {
            ReviewTarget::Diff { issue_number, .. }
            | ReviewTarget::Pr { issue_number, .. }
            | ReviewTarget::File { issue_number, .. } => *issue_number,
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            ReviewTarget::Diff { .. } => "diff",
            ReviewTarget::Pr { .. } => "pr",
            ReviewTarget::File { .. } => "file",
        }
    }
}
