// LogWire - core/sink.rs
//
// Built-in sink kinds writing to an `OutputStream`:
//   - `StreamSink`: one human-readable text line per message.
//   - `JsonSink`: one JSON object per message.
// Core layer: renders into memory and hands bytes to the stream; the stream
// owns the transport.

use crate::core::handler::{LogSink, OutputStream};
use crate::core::model::{Level, LogAttributes};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;

/// Line terminator appended to every rendered message.
const LINE_END: &str = "\r\n";

/// Renders a message as
/// `<time> [category] [file]:[line], [function]: <LEVEL>: <message> [code = N, details = S]`.
///
/// Absent parts are omitted together with their separators.
pub fn render_text(msg: &str, level: Level, category: Option<&str>, attr: &LogAttributes) -> String {
    let mut line = String::with_capacity(msg.len() + 64);
    let time = attr.time.unwrap_or_else(Utc::now);
    line.push_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true));
    line.push(' ');

    if let Some(category) = category.filter(|c| !c.is_empty()) {
        let _ = write!(line, "[{category}] ");
    }

    let mut has_source = false;
    if let Some(file) = &attr.file {
        // Only the base name; full build paths are noise on a serial console.
        let base = file.rsplit(['/', '\\']).next().unwrap_or(file);
        line.push_str(base);
        if let Some(n) = attr.line {
            let _ = write!(line, ":{n}");
        }
        has_source = true;
    }
    if let Some(function) = &attr.function {
        if has_source {
            line.push_str(", ");
        }
        let _ = write!(line, "{function}()");
        has_source = true;
    }
    if has_source {
        line.push_str(": ");
    }

    let _ = write!(line, "{}: {msg}", level.name());

    let mut extras = Vec::new();
    if let Some(code) = attr.code {
        extras.push(format!("code = {code}"));
    }
    if let Some(details) = &attr.details {
        extras.push(format!("details = {details}"));
    }
    if !extras.is_empty() {
        let _ = write!(line, " [{}]", extras.join(", "));
    }

    line.push_str(LINE_END);
    line
}

/// Text sink writing one line per message.
pub struct StreamSink {
    stream: Arc<dyn OutputStream>,
}

impl StreamSink {
    pub fn new(stream: Arc<dyn OutputStream>) -> Self {
        Self { stream }
    }

    /// The stream this sink writes to.
    pub fn stream(&self) -> &Arc<dyn OutputStream> {
        &self.stream
    }
}

impl LogSink for StreamSink {
    fn log_message(&self, msg: &str, level: Level, category: Option<&str>, attr: &LogAttributes) {
        let line = render_text(msg, level, category, attr);
        self.stream.write(line.as_bytes());
    }

    fn write(&self, data: &[u8]) {
        self.stream.write(data);
    }
}

/// Wire shape of one JSON log record.
#[derive(Serialize)]
struct JsonRecord<'a> {
    level: Level,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

/// Renders a message as a single-line JSON object (no trailing newline).
pub fn render_json(
    msg: &str,
    level: Level,
    category: Option<&str>,
    attr: &LogAttributes,
) -> Result<String, serde_json::Error> {
    let record = JsonRecord {
        level,
        message: msg,
        category: category.filter(|c| !c.is_empty()),
        time: attr.time.unwrap_or_else(Utc::now),
        file: attr.file.as_deref(),
        line: attr.line,
        function: attr.function.as_deref(),
        code: attr.code,
        details: attr.details.as_deref(),
    };
    serde_json::to_string(&record)
}

/// JSON sink writing one object per line.
pub struct JsonSink {
    stream: Arc<dyn OutputStream>,
}

impl JsonSink {
    pub fn new(stream: Arc<dyn OutputStream>) -> Self {
        Self { stream }
    }
}

impl LogSink for JsonSink {
    fn log_message(&self, msg: &str, level: Level, category: Option<&str>, attr: &LogAttributes) {
        match render_json(msg, level, category, attr) {
            Ok(mut record) => {
                record.push_str(LINE_END);
                self.stream.write(record.as_bytes());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping log record that failed to serialise");
            }
        }
    }

    fn write(&self, data: &[u8]) {
        self.stream.write(data);
    }
}
