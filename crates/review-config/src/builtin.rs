//! Default agent/selector/aggregator definitions shipped with the crate,
//! in place of an on-disk built-in definitions directory. A project's
//! `.hachimoku/agents/` directory may add new agents or override these by
//! name.

pub const BUILTIN_AGENTS: &[(&str, &str)] = &[
    (
        "correctness.toml",
        r#"
name = "correctness"
description = "Looks for logic errors, off-by-one mistakes, and incorrect edge-case handling."
model = "anthropic:claude-3-5-sonnet-latest"
phase = "main"
system_prompt = "You review code changes for correctness bugs. Report only issues you are confident are real."

[applicability]
always = true
"#,
    ),
    (
        "style.toml",
        r#"
name = "style"
description = "Flags naming, formatting, and idiom issues specific to the changed files' language."
model = "anthropic:claude-3-5-sonnet-latest"
phase = "final"
system_prompt = "You review code changes for style and idiom issues. Keep findings to nitpick or suggestion severity."

[applicability]
file_patterns = ["*.rs", "*.py", "*.ts", "*.go"]
"#,
    ),
];

pub const BUILTIN_SELECTOR: &str = r#"
model = "anthropic:claude-3-5-sonnet-latest"
system_prompt = "You choose which review agents are applicable to this change, based on the diff and the available agent descriptions."
"#;

pub const BUILTIN_AGGREGATOR: &str = r#"
model = "anthropic:claude-3-5-sonnet-latest"
system_prompt = "You merge findings from multiple review agents into one deduplicated report, grouping related issues and noting any agent that failed."
"#;
