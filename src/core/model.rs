// LogWire - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// process-wide state.
//
// These types are the shared vocabulary across all layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Level
// =============================================================================

/// Ordered message severity.
///
/// The discriminants match the device firmware's numeric levels so a level can
/// be exchanged with C callers as a plain integer. A message is emitted when its
/// level is greater than or equal to the threshold in effect for its category;
/// `None` as a threshold therefore disables all output.
///
/// Deserialisation goes through `FromStr`, so the wire protocol and config
/// files accept the same case-insensitive names and aliases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[repr(u8)]
pub enum Level {
    Trace = 1,
    Debug = 20,
    #[default]
    Info = 30,
    Warn = 40,
    Error = 50,
    Panic = 60,
    None = 70,
}

impl Level {
    /// Returns all variants in ascending order.
    pub fn all() -> &'static [Level] {
        &[
            Level::Trace,
            Level::Debug,
            Level::Info,
            Level::Warn,
            Level::Error,
            Level::Panic,
            Level::None,
        ]
    }

    /// Upper-case name used by text sinks.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Panic => "PANIC",
            Level::None => "NONE",
        }
    }

    /// Lower-case name used on the wire and in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Panic => "panic",
            Level::None => "none",
        }
    }

    /// Maps a raw firmware level to the nearest level at or below it.
    ///
    /// Values below `Trace` clamp to `Trace`; values above `None` clamp to `None`.
    pub fn from_raw(raw: u8) -> Level {
        Level::all()
            .iter()
            .rev()
            .copied()
            .find(|l| *l as u8 <= raw)
            .unwrap_or(Level::Trace)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a level name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    /// The rejected input.
    pub invalid_level: String,
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid log level '{}'. Valid values: all, trace, debug, info, warn, error, panic, none",
            self.invalid_level
        )
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" | "err" => Ok(Level::Error),
            "panic" | "fatal" => Ok(Level::Panic),
            "none" => Ok(Level::None),
            _ => Err(ParseLevelError {
                invalid_level: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = ParseLevelError;

    fn try_from(s: String) -> Result<Self, ParseLevelError> {
        s.parse()
    }
}

// =============================================================================
// Category override
// =============================================================================

/// A `(category path, minimum level)` pair supplied when building a filter.
///
/// `category` is a dot-delimited path such as `"app.net.tcp"`. The empty path
/// denotes the root and overrides the filter's default level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOverride {
    pub category: String,
    pub level: Level,
}

impl CategoryOverride {
    pub fn new(category: impl Into<String>, level: Level) -> Self {
        Self {
            category: category.into(),
            level,
        }
    }
}

/// Splits a category into its non-empty segments.
///
/// Empty segments (leading, trailing, or doubled dots) are dropped, so
/// `".a..b."` and `"a.b"` name the same category. Filter construction and
/// lookup both go through this so the two always agree.
pub fn category_segments(category: &str) -> impl Iterator<Item = &str> {
    category.split('.').filter(|s| !s.is_empty())
}

// =============================================================================
// Message attributes
// =============================================================================

/// Optional attributes attached to a log message.
///
/// Every field is optional; sinks render only the ones that are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogAttributes {
    /// Source file name.
    pub file: Option<String>,
    /// Line number in `file`.
    pub line: Option<u32>,
    /// Function name.
    pub function: Option<String>,
    /// Time the message was produced. Sinks use the current time when absent.
    pub time: Option<DateTime<Utc>>,
    /// Application-defined status code.
    pub code: Option<i64>,
    /// Free-form detail string.
    pub details: Option<String>,
}

impl LogAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Returns true if no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Panic);
        assert!(Level::Panic < Level::None);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("trace".parse::<Level>().unwrap(), Level::Trace);
        assert_eq!("ALL".parse::<Level>().unwrap(), Level::Trace);
        assert_eq!("Warning".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!(" error ".parse::<Level>().unwrap(), Level::Error);
        assert_eq!("none".parse::<Level>().unwrap(), Level::None);

        let err = "loud".parse::<Level>().unwrap_err();
        assert_eq!(err.invalid_level, "loud");
    }

    #[test]
    fn test_level_serde_names() {
        assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"warn\"");
        let lvl: Level = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(lvl, Level::Trace);
        let err = serde_json::from_str::<Level>("\"loud\"").unwrap_err();
        assert!(err.to_string().contains("Invalid log level 'loud'"));
    }

    #[test]
    fn test_level_deserialise_matches_from_str() {
        for name in ["ERROR", "Error", "err", "fatal", "WARN", "warning", "All", " info "] {
            let json = serde_json::to_string(name).unwrap();
            let from_json: Level = serde_json::from_str(&json).unwrap();
            assert_eq!(from_json, name.parse::<Level>().unwrap(), "{name}");
        }
    }

    #[test]
    fn test_level_from_raw_clamps() {
        assert_eq!(Level::from_raw(0), Level::Trace);
        assert_eq!(Level::from_raw(30), Level::Info);
        assert_eq!(Level::from_raw(45), Level::Warn);
        assert_eq!(Level::from_raw(255), Level::None);
    }

    #[test]
    fn test_category_segments_drop_empty() {
        let segs: Vec<_> = category_segments(".a..b.").collect();
        assert_eq!(segs, vec!["a", "b"]);
        assert_eq!(category_segments("").count(), 0);
    }

    #[test]
    fn test_attributes_builder() {
        let attr = LogAttributes::new().with_code(-1).with_details("eof");
        assert_eq!(attr.code, Some(-1));
        assert_eq!(attr.details.as_deref(), Some("eof"));
        assert!(!attr.is_empty());
        assert!(LogAttributes::default().is_empty());
    }
}
