//! CLI-specific error types and exit code mapping

use hookline_core::error::HooklineError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The suite ran but at least one test or scope hook failed.
    #[error("{failed} test(s) failed, {scope_failures} scope hook failure(s)")]
    TestsFailed { failed: usize, scope_failures: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from hookline-core.
    #[error("{0}")]
    Core(#[from] HooklineError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                        |
    /// |------|--------------------------------|
    /// | 0    | Success                        |
    /// | 1    | General / command error        |
    /// | 2    | Configuration error            |
    /// | 4    | One or more tests failed       |
    /// | 10   | IO error                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(HooklineError::Config(_)) => 2,
            Self::TestsFailed { .. } => 4,
            Self::Io(_) | Self::Core(HooklineError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}
