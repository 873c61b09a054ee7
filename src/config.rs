//! Logger configuration and its environment overrides.
//!
//! `LoggerConfig` holds the live settings; `LoggerConfigPatch` carries any subset
//! of them and is merged on top, leaving absent fields untouched.

use crate::error::{Error, Result};
use crate::level::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const LOG_LEVEL_ENV: &str = "TESTLENS_LOG_LEVEL";
pub const LOG_TO_FILE_ENV: &str = "TESTLENS_LOG_TO_FILE";
pub const LOG_FILE_ENV: &str = "TESTLENS_LOG_FILE";

pub const DEFAULT_MAX_LINE_LENGTH: usize = 200;
pub const DEFAULT_LOG_FILE: &str = "test-execution.log";
pub const DEFAULT_CONTEXT: &str = "App";

/// Applied alongside environment overrides: runner output tends to carry longer
/// lines than interactive use.
pub const ENV_MAX_LINE_LENGTH: usize = 500;
pub const ENV_CONTEXT: &str = "TestRunner";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub enable_timestamps: bool,
    pub enable_colors: bool,
    pub enable_file_logging: bool,
    pub log_file: PathBuf,
    pub max_line_length: usize,
    pub context: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            enable_timestamps: true,
            enable_colors: true,
            enable_file_logging: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            context: DEFAULT_CONTEXT.to_string(),
        }
    }
}

impl LoggerConfig {
    /// Merge `patch` into this config.
    pub fn apply(&mut self, patch: &LoggerConfigPatch) {
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(enabled) = patch.enable_timestamps {
            self.enable_timestamps = enabled;
        }
        if let Some(enabled) = patch.enable_colors {
            self.enable_colors = enabled;
        }
        if let Some(enabled) = patch.enable_file_logging {
            self.enable_file_logging = enabled;
        }
        if let Some(path) = &patch.log_file {
            self.log_file.clone_from(path);
        }
        if let Some(max) = patch.max_line_length {
            self.max_line_length = max;
        }
        if let Some(context) = &patch.context {
            self.context.clone_from(context);
        }
    }
}

/// A partial configuration. Every `None` field leaves the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoggerConfigPatch {
    pub level: Option<LogLevel>,
    pub enable_timestamps: Option<bool>,
    pub enable_colors: Option<bool>,
    pub enable_file_logging: Option<bool>,
    pub log_file: Option<PathBuf>,
    pub max_line_length: Option<usize>,
    pub context: Option<String>,
}

impl LoggerConfigPatch {
    #[must_use]
    pub const fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub const fn timestamps(mut self, enabled: bool) -> Self {
        self.enable_timestamps = Some(enabled);
        self
    }

    #[must_use]
    pub const fn colors(mut self, enabled: bool) -> Self {
        self.enable_colors = Some(enabled);
        self
    }

    #[must_use]
    pub const fn file_logging(mut self, enabled: bool) -> Self {
        self.enable_file_logging = Some(enabled);
        self
    }

    #[must_use]
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    #[must_use]
    pub const fn max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = Some(max);
        self
    }

    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Load a patch from a JSON file with camelCase keys.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|err| {
            Error::config(format!("failed to parse {}: {err}", path.display()))
        })
    }

    /// Overrides from the process environment, if any are set.
    pub fn from_env() -> Option<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Overrides from an arbitrary variable lookup.
    ///
    /// Returns `None` when none of the variables is present. Otherwise the patch
    /// also carries the runner defaults for line length and context label.
    pub fn from_env_with<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = lookup(LOG_LEVEL_ENV);
        let to_file = lookup(LOG_TO_FILE_ENV);
        let file = lookup(LOG_FILE_ENV);
        if level.is_none() && to_file.is_none() && file.is_none() {
            return None;
        }

        let mut patch = Self::default()
            .max_line_length(ENV_MAX_LINE_LENGTH)
            .context(ENV_CONTEXT);

        if let Some(raw) = level {
            match raw.parse::<LogLevel>() {
                Ok(level) => patch.level = Some(level),
                Err(err) => tracing::warn!("Ignoring {LOG_LEVEL_ENV}: {err}"),
            }
        }
        if let Some(raw) = to_file {
            patch.enable_file_logging = Some(parse_flag(&raw));
        }
        if let Some(path) = file.filter(|path| !path.trim().is_empty()) {
            patch.log_file = Some(PathBuf::from(path.trim()));
        }

        Some(patch)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
