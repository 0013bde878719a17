use review_core::error::ToolPolicyError;

/// A named tool capability an agent can be granted. Resolution from a
/// category name is the only fallible step; once resolved, a `ToolHandle`
/// is an opaque capability token the agent runner hands to the model
/// adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolHandle {
    GitRead,
    GhRead,
    FileRead,
    WebFetch,
}

impl ToolHandle {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolHandle::GitRead => "git_read",
            ToolHandle::GhRead => "gh_read",
            ToolHandle::FileRead => "file_read",
            ToolHandle::WebFetch => "web_fetch",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedTools {
    pub tools: Vec<ToolHandle>,
}

fn resolve_one(category: &str) -> Option<ToolHandle> {
    match category {
        "git_read" => Some(ToolHandle::GitRead),
        "gh_read" => Some(ToolHandle::GhRead),
        "file_read" => Some(ToolHandle::FileRead),
        "web_fetch" => Some(ToolHandle::WebFetch),
        _ => None,
    }
}

pub fn resolve_tools(categories: &[String]) -> Result<ResolvedTools, ToolPolicyError> {
    let mut tools = Vec::with_capacity(categories.len());
    for category in categories {
        match resolve_one(category) {
            Some(handle) => tools.push(handle),
            None => return Err(ToolPolicyError::UnknownCategory(category.clone())),
        }
    }
    Ok(ResolvedTools { tools })
}

pub fn validate_categories(categories: &[String]) -> Vec<String> {
    categories.iter().filter(|c| resolve_one(c).is_none()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_categories() {
        let resolved = resolve_tools(&["git_read".to_string(), "gh_read".to_string()]).unwrap();
        assert_eq!(resolved.tools, vec![ToolHandle::GitRead, ToolHandle::GhRead]);
    }

    #[test]
    fn rejects_unknown_category() {
        assert!(resolve_tools(&["network_write".to_string()]).is_err());
    }

    #[test]
    fn validate_categories_reports_only_invalid_names() {
        let invalid = validate_categories(&["git_read".to_string(), "bogus".to_string()]);
        assert_eq!(invalid, vec!["bogus".to_string()]);
    }
}
