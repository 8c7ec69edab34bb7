// LogWire - core/handler.rs
//
// Log handlers: one category filter bound to one message sink.
// The handler is the single filtering gate; no message reaches a sink
// without passing `LogHandler::message` or `LogHandler::write`.

use crate::core::filter::CategoryFilter;
use crate::core::model::{CategoryOverride, Level, LogAttributes};
use std::fmt;

/// Byte-oriented output transport (serial port, socket, file, ...).
///
/// Writes take `&self` because the same stream may be reached from several
/// logging threads at once; implementations serialise their own writes.
/// Transport failures are the stream's concern and are not reported back.
pub trait OutputStream: Send + Sync {
    fn write(&self, data: &[u8]);

    /// Push buffered bytes to the transport. Default does nothing.
    fn flush(&self) {}
}

/// Destination for messages that passed a handler's filter.
///
/// `log_message` receives composed message text plus metadata and is
/// expected to render and emit it. `write` receives raw bytes; the default
/// implementation drops them.
pub trait LogSink: Send + Sync {
    fn log_message(&self, msg: &str, level: Level, category: Option<&str>, attr: &LogAttributes);

    fn write(&self, _data: &[u8]) {}
}

/// A filtered consumer of log messages.
///
/// `LogHandler` is neither `Clone` nor `PartialEq`: the registry identifies
/// handlers by address, and two handlers never compare equal by value.
pub struct LogHandler {
    filter: CategoryFilter,
    sink: Box<dyn LogSink>,
}

impl LogHandler {
    /// Handler with a default level and no category overrides.
    pub fn new(sink: impl LogSink + 'static, level: Level) -> Self {
        Self::with_filter(Box::new(sink), CategoryFilter::new(level))
    }

    /// Handler with a default level and category overrides.
    pub fn with_filters(
        sink: impl LogSink + 'static,
        level: Level,
        filters: &[CategoryOverride],
    ) -> Self {
        Self::with_filter(Box::new(sink), CategoryFilter::build(filters, level))
    }

    /// Handler around an already built filter and boxed sink.
    pub fn with_filter(sink: Box<dyn LogSink>, filter: CategoryFilter) -> Self {
        Self { filter, sink }
    }

    /// Default logging level.
    pub fn level(&self) -> Level {
        self.filter.level()
    }

    /// Logging level enabled for a category.
    pub fn level_for(&self, category: Option<&str>) -> Level {
        self.filter.level_for(category)
    }

    /// Returns true if a message at `level` in `category` would be forwarded.
    pub fn accepts(&self, level: Level, category: Option<&str>) -> bool {
        level >= self.filter.level_for(category)
    }

    /// Forward a message to the sink if the filter accepts it.
    pub fn message(&self, msg: &str, level: Level, category: Option<&str>, attr: &LogAttributes) {
        if self.accepts(level, category) {
            self.sink.log_message(msg, level, category, attr);
        }
    }

    /// Forward raw bytes to the sink if the filter accepts them.
    pub fn write(&self, data: &[u8], level: Level, category: Option<&str>) {
        if self.accepts(level, category) {
            self.sink.write(data);
        }
    }
}

impl fmt::Debug for LogHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHandler")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}
