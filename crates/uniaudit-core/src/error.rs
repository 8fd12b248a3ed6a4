// ── Core error types ──
//
// The audit itself never fails: malformed rows are dropped and unknown
// values degrade to inert defaults. Errors only surface at the edges,
// when a whole document cannot be decoded or a setting name is bogus.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid JSON in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {setting} value '{value}' (expected one of: {expected})")]
    InvalidSetting {
        setting: &'static str,
        value: String,
        expected: String,
    },
}
