//! Log severity levels.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log entry severity level.
///
/// Levels are ordered: an entry is emitted only when its level is at or above
/// the configured threshold. `Silent` is a threshold only; nothing is logged at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Detailed debugging information.
    Debug,
    /// General progress information.
    Info,
    /// Unexpected but non-fatal conditions.
    Warn,
    /// Failures.
    Error,
    /// Suppresses all output when used as the threshold.
    Silent,
}

impl LogLevel {
    pub const ALL: [Self; 5] = [
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Silent,
    ];

    /// Upper-case name used in file lines and configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Silent => "SILENT",
        }
    }

    /// Returns the ANSI color code for this log level.
    pub const fn color_code(self) -> &'static str {
        match self {
            Self::Debug => "\x1b[90m", // Gray
            Self::Info => "\x1b[36m",  // Cyan
            Self::Warn => "\x1b[33m",  // Yellow
            Self::Error => "\x1b[31m", // Red
            Self::Silent => "",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Debug => "🔍",
            Self::Info => "ℹ️",
            Self::Warn => "⚠️",
            Self::Error => "❌",
            Self::Silent => "",
        }
    }

    /// Parse a level name, case-insensitively. Surrounding whitespace is ignored.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" | "WARNING" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            "SILENT" => Some(Self::Silent),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::invalid_level(s.trim()))
    }
}
