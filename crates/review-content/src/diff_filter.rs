use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn section_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^diff --git ").expect("static pattern is valid"))
}

fn path_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^diff --git a/.+ b/(.+)$").expect("static pattern is valid"))
}

/// Filters a unified diff down to sections touching paths matching any of
/// `file_patterns` (glob-matched against the destination basename). Falls
/// back to the unfiltered input whenever there is nothing to filter by or
/// nothing matched — this is recovery behavior, not an error: a selector
/// that over-scopes `file_patterns` should still see the whole diff rather
/// than an empty one.
pub fn filter_diff_by_file_patterns(diff_text: &str, file_patterns: &[String]) -> String {
    if file_patterns.is_empty() {
        return diff_text.to_string();
    }
    let boundary = section_boundary();
    let mut matches: Vec<_> = boundary.find_iter(diff_text).map(|m| m.start()).collect();
    if matches.is_empty() {
        return diff_text.to_string();
    }
    matches.push(diff_text.len());

    let mut seen_paths: HashSet<String> = HashSet::new();
    let mut kept_sections = Vec::new();

    for window in matches.windows(2) {
        let (start, end) = (window[0], window[1]);
        let section = &diff_text[start..end];
        let first_line = section.lines().next().unwrap_or("");
        let Some(captures) = path_pattern().captures(first_line) else {
            continue;
        };
        let dest_path = captures.get(1).map(|m| m.as_str()).unwrap_or("");
        let basename = dest_path.rsplit('/').next().unwrap_or(dest_path);

        let pattern_matches = file_patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern).map(|p| p.matches(basename)).unwrap_or(false)
        });
        if !pattern_matches {
            continue;
        }
        if seen_paths.insert(dest_path.to_string()) {
            kept_sections.push(section);
        }
    }

    if kept_sections.is_empty() {
        return diff_text.to_string();
    }
    kept_sections.concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DIFF: &str = "diff --git a/src/main.rs b/src/main.rs\n@@ -1 +1 @@\n-old\n+new\ndiff --git a/README.md b/README.md\n@@ -1 +1 @@\n-old\n+new\n";

    #[test]
    fn keeps_only_matching_sections() {
        let filtered = filter_diff_by_file_patterns(SAMPLE_DIFF, &["*.rs".to_string()]);
        assert!(filtered.contains("main.rs"));
        assert!(!filtered.contains("README.md"));
    }

    #[test]
    fn falls_back_to_unfiltered_on_empty_patterns() {
        let filtered = filter_diff_by_file_patterns(SAMPLE_DIFF, &[]);
        assert_eq!(filtered, SAMPLE_DIFF);
    }

    #[test]
    fn falls_back_to_unfiltered_when_nothing_matches() {
        let filtered = filter_diff_by_file_patterns(SAMPLE_DIFF, &["*.go".to_string()]);
        assert_eq!(filtered, SAMPLE_DIFF);
    }

    #[test]
    fn dedups_by_first_seen_destination_path() {
        let doubled = format!("{SAMPLE_DIFF}diff --git a/src/main.rs b/src/main.rs\n@@ -2 +2 @@\n-x\n+y\n");
        let filtered = filter_diff_by_file_patterns(&doubled, &["*.rs".to_string()]);
        assert_eq!(filtered.matches("diff --git").count(), 1);
    }
}
