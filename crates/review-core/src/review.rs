use serde::{Deserialize, Serialize};

use crate::severity::Severity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLocation {
    pub file_path: String,
    pub line_number: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewIssue {
    pub agent_name: String,
    pub severity: Severity,
    pub description: String,
    pub location: Option<FileLocation>,
    pub suggestion: Option<String>,
    pub category: Option<String>,
}
