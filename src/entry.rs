//! Log entries and their console/file renderings.

use crate::level::LogLevel;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

const RESET: &str = "\x1b[0m";

/// A primitive value attached to a log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Free-form data attached to an entry.
///
/// Metadata is only ever rendered for display; nothing reads its shape back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Metadata {
    /// Key-value pairs, rendered in key order.
    Fields(BTreeMap<String, String>),
    /// An error carried alongside the message.
    Error { message: String },
    Scalar(Scalar),
}

impl Metadata {
    /// Build a `Fields` variant from any iterator of displayable pairs.
    pub fn fields<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: fmt::Display,
    {
        Self::Fields(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.to_string()))
                .collect(),
        )
    }

    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fields(fields) => {
                f.write_str("{")?;
                for (idx, (key, value)) in fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
            Self::Error { message } => write!(f, "(error: {message})"),
            Self::Scalar(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for Metadata {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for Metadata {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Int(value))
    }
}

impl From<f64> for Metadata {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float(value))
    }
}

impl From<&str> for Metadata {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::Text(value.to_string()))
    }
}

impl From<String> for Metadata {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::Text(value))
    }
}

/// A single log entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    timestamp: DateTime<Utc>,
    level: LogLevel,
    message: String,
    context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
}

impl LogEntry {
    /// `message` must already be normalized.
    pub(crate) const fn new(
        timestamp: DateTime<Utc>,
        level: LogLevel,
        message: String,
        context: String,
        metadata: Option<Metadata>,
    ) -> Self {
        Self {
            timestamp,
            level,
            message,
            context,
            metadata,
        }
    }

    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub const fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub const fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// RFC 3339 timestamp with millisecond precision.
    pub fn iso_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Console rendering, without a trailing newline.
    pub fn format_console(&self, timestamps: bool, colors: bool) -> String {
        let mut line = String::with_capacity(self.message.len() + 64);
        if timestamps {
            line.push('[');
            line.push_str(&self.iso_timestamp());
            line.push_str("] ");
        }
        line.push_str(self.level.icon());
        line.push(' ');
        if colors {
            line.push_str(self.level.color_code());
        }
        line.push('[');
        line.push_str(&self.context);
        line.push_str("] ");
        line.push_str(&self.message);
        if let Some(metadata) = &self.metadata {
            line.push(' ');
            line.push_str(&metadata.to_string());
        }
        if colors {
            line.push_str(RESET);
        }
        line
    }

    /// File rendering: `ISO LEVEL [context] message\n`.
    pub fn format_file(&self) -> String {
        let mut line = format!(
            "{} {} [{}] {}",
            self.iso_timestamp(),
            self.level.as_str(),
            self.context,
            self.message
        );
        if let Some(metadata) = &self.metadata {
            line.push(' ');
            line.push_str(&metadata.to_string());
        }
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(metadata: Option<Metadata>) -> LogEntry {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap();
        LogEntry::new(
            ts,
            LogLevel::Warn,
            "disk almost full".to_string(),
            "Storage".to_string(),
            metadata,
        )
    }

    #[test]
    fn file_format_is_plain_and_newline_terminated() {
        assert_eq!(
            entry(None).format_file(),
            "2026-03-01T12:30:05.000Z WARN [Storage] disk almost full\n"
        );
    }

    #[test]
    fn console_format_without_timestamp_or_color() {
        assert_eq!(
            entry(None).format_console(false, false),
            "⚠️ [Storage] disk almost full"
        );
    }

    #[test]
    fn console_format_with_everything() {
        let line = entry(None).format_console(true, true);
        assert_eq!(
            line,
            "[2026-03-01T12:30:05.000Z] ⚠️ \x1b[33m[Storage] disk almost full\x1b[0m"
        );
    }

    #[test]
    fn metadata_is_rendered_after_the_message() {
        let metadata = Metadata::fields([("free", "3%"), ("mount", "/var")]);
        assert_eq!(
            entry(Some(metadata)).format_console(false, false),
            "⚠️ [Storage] disk almost full {free=3%, mount=/var}"
        );
        assert_eq!(
            entry(Some(Metadata::from(42_i64))).format_file(),
            "2026-03-01T12:30:05.000Z WARN [Storage] disk almost full 42\n"
        );
    }

    #[test]
    fn error_metadata_displays_message() {
        let io = std::io::Error::other("quota exceeded");
        assert_eq!(Metadata::error(&io).to_string(), "(error: quota exceeded)");
    }
}
