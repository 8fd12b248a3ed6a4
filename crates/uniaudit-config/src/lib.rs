//! Configuration for the uniaudit CLI.
//!
//! A single TOML file holds output defaults and audit settings. Values are
//! layered with figment: built-in defaults, then the file, then
//! `UNIAUDIT_*` environment variables (`__` separates nested keys, so
//! `UNIAUDIT_AUDIT__MIN_SEVERITY=critical` sets `[audit] min_severity`).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use uniaudit_core::{AuditSettings, CheckKind, CoreError, parse_severity};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, err: &CoreError) -> Self {
        Self::Validation {
            field: field.into(),
            reason: err.to_string(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub audit: AuditSection,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// `table`, `json`, `json-compact`, `yaml` or `plain`.
    #[serde(default = "default_output")]
    pub output: String,

    /// `auto`, `always` or `never`.
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// `[audit]` table. Kept as strings so a typo surfaces as a validation
/// error naming the field instead of a generic deserialization failure.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AuditSection {
    pub min_severity: Option<String>,

    #[serde(default)]
    pub disabled_checks: Vec<String>,

    pub fail_on: Option<String>,
}

impl AuditSection {
    /// Validate and convert to core settings.
    pub fn to_settings(&self) -> Result<AuditSettings, ConfigError> {
        let min_severity = self
            .min_severity
            .as_deref()
            .map(parse_severity)
            .transpose()
            .map_err(|e| ConfigError::invalid("audit.min_severity", &e))?;
        let fail_on = self
            .fail_on
            .as_deref()
            .map(parse_severity)
            .transpose()
            .map_err(|e| ConfigError::invalid("audit.fail_on", &e))?;
        let disabled_checks = self
            .disabled_checks
            .iter()
            .map(|raw| CheckKind::parse(raw))
            .collect::<Result<_, _>>()
            .map_err(|e| ConfigError::invalid("audit.disabled_checks", &e))?;

        Ok(AuditSettings {
            min_severity,
            disabled_checks,
            fail_on,
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "uniaudit", "uniaudit").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("uniaudit");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from `path` (or the canonical path) plus environment.
///
/// A missing file is not an error; the defaults and environment still apply.
pub fn load_config_from(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("UNIAUDIT_").split("__"));

    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parent dirs.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
