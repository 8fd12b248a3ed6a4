//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use uniaudit_config::ConfigError;
use uniaudit_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const FINDINGS: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Inputs ───────────────────────────────────────────────────────
    #[error("Input file not found: {path}")]
    #[diagnostic(
        code(uniaudit::file_not_found),
        help("Export the document from the controller first, then pass its path.")
    )]
    FileNotFound { path: String },

    #[error("Could not read {path}")]
    #[diagnostic(code(uniaudit::read_failed))]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {reason}")]
    #[diagnostic(
        code(uniaudit::invalid_input),
        help("Pass the raw controller response; bare arrays and {{\"data\": [...]}} envelopes are both accepted.")
    )]
    InvalidInput { path: String, reason: String },

    #[error("Network '{identifier}' not found")]
    #[diagnostic(
        code(uniaudit::network_not_found),
        help("Run: uniaudit networks --devices <FILE> to see available networks")
    )]
    NetworkNotFound { identifier: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(uniaudit::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(uniaudit::config),
        help("Check the config file, or recreate it with: uniaudit config init --force")
    )]
    Config(#[from] ConfigError),

    // ── Audit outcome ────────────────────────────────────────────────
    #[error("{count} finding(s) at or above {threshold} severity")]
    #[diagnostic(code(uniaudit::findings))]
    FindingsAtThreshold { count: usize, threshold: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } | Self::NetworkNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::Config(ConfigError::Validation { .. }) => {
                exit_code::USAGE
            }
            Self::FindingsAtThreshold { .. } => exit_code::FINDINGS,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Json { context, source } => CliError::InvalidInput {
                path: context,
                reason: source.to_string(),
            },
            CoreError::InvalidSetting {
                setting,
                value,
                expected,
            } => CliError::Validation {
                field: setting.into(),
                reason: format!("'{value}' (expected one of: {expected})"),
            },
        }
    }
}
