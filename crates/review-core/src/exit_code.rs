use crate::severity::Severity;

/// Process exit codes. `InputError` is reserved for the CLI layer; the
/// engine itself only ever produces the other four.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Critical = 1,
    Important = 2,
    ExecutionError = 3,
    InputError = 4,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_max_severity(max_severity: Option<Severity>) -> Self {
        match max_severity {
            Some(Severity::Critical) => ExitCode::Critical,
            Some(Severity::Important) => ExitCode::Important,
            _ => ExitCode::Success,
        }
    }
}
