// LogWire - app/logger.rs
//
// Category-bound front end over a `LogManager`. Application code holds a
// `Logger` per subsystem and emits through it; the logger checks whether any
// handler will accept a message before formatting it.
//
//   let log = Logger::new("app.net");
//   log.info(format_args!("connected to {addr}"));
//   log.code(-5).details("refused").error(format_args!("connect failed"));

use crate::app::manager::LogManager;
use crate::core::model::{Level, LogAttributes};
use crate::util::constants;
use std::borrow::Cow;
use std::fmt::{self, Write as _};

/// Emits messages in one category through a `LogManager`.
#[derive(Clone)]
pub struct Logger<'m> {
    name: String,
    manager: &'m LogManager,
}

impl Logger<'static> {
    /// Logger for `name` on the process-wide manager.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_manager(name, LogManager::instance())
    }
}

impl Default for Logger<'static> {
    fn default() -> Self {
        Self::new(constants::DEFAULT_CATEGORY)
    }
}

impl<'m> Logger<'m> {
    /// Logger for `name` on a specific manager.
    pub fn with_manager(name: impl Into<String>, manager: &'m LogManager) -> Self {
        Self {
            name: name.into(),
            manager,
        }
    }

    /// Category name. May be empty, in which case messages carry no category.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> Option<&str> {
        (!self.name.is_empty()).then_some(self.name.as_str())
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.manager.is_enabled(level, self.category())
    }

    pub fn is_trace_enabled(&self) -> bool {
        self.is_enabled(Level::Trace)
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.is_enabled(Level::Debug)
    }

    pub fn is_info_enabled(&self) -> bool {
        self.is_enabled(Level::Info)
    }

    pub fn is_warn_enabled(&self) -> bool {
        self.is_enabled(Level::Warn)
    }

    pub fn is_error_enabled(&self) -> bool {
        self.is_enabled(Level::Error)
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>, attr: &LogAttributes) {
        if !self.is_enabled(level) {
            return;
        }
        let msg = match args.as_str() {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(args.to_string()),
        };
        self.manager.dispatch(&msg, level, self.category(), attr);
    }

    /// Emit a formatted message at `level`.
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.emit(level, args, &LogAttributes::default());
    }

    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    /// Write a string as raw output at the default message level.
    pub fn print(&self, text: &str) {
        self.print_at(constants::DEFAULT_MESSAGE_LEVEL, text);
    }

    pub fn print_at(&self, level: Level, text: &str) {
        self.write_at(level, text.as_bytes());
    }

    /// Write raw bytes at the default message level.
    pub fn write(&self, data: &[u8]) {
        self.write_at(constants::DEFAULT_MESSAGE_LEVEL, data);
    }

    pub fn write_at(&self, level: Level, data: &[u8]) {
        self.manager.dispatch_write(data, level, self.category());
    }

    /// Write bytes as lowercase hex at the default message level.
    pub fn dump(&self, data: &[u8]) {
        self.dump_at(constants::DEFAULT_MESSAGE_LEVEL, data);
    }

    pub fn dump_at(&self, level: Level, data: &[u8]) {
        if data.is_empty() || !self.is_enabled(level) {
            return;
        }
        self.write_at(level, to_hex(data).as_bytes());
    }

    /// Start a message carrying an application status code.
    pub fn code(&self, code: i64) -> AttributedLogger<'_, 'm> {
        AttributedLogger::new(self).code(code)
    }

    /// Start a message carrying a detail string.
    pub fn details(&self, details: impl Into<String>) -> AttributedLogger<'_, 'm> {
        AttributedLogger::new(self).details(details)
    }
}

impl fmt::Debug for Logger<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish_non_exhaustive()
    }
}

fn to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// A pending message with attributes attached. Consumed by the emitting call.
#[must_use = "attributes are only used by a following log call"]
pub struct AttributedLogger<'a, 'm> {
    logger: &'a Logger<'m>,
    attr: LogAttributes,
}

impl<'a, 'm> AttributedLogger<'a, 'm> {
    fn new(logger: &'a Logger<'m>) -> Self {
        Self {
            logger,
            attr: LogAttributes::default(),
        }
    }

    pub fn code(mut self, code: i64) -> Self {
        self.attr.code = Some(code);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.attr.details = Some(details.into());
        self
    }

    /// Attach a source location.
    pub fn at(mut self, file: &str, line: u32) -> Self {
        self.attr.file = Some(file.to_string());
        self.attr.line = Some(line);
        self
    }

    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.attr.function = Some(function.into());
        self
    }

    pub fn log(self, level: Level, args: fmt::Arguments<'_>) {
        self.logger.emit(level, args, &self.attr);
    }

    pub fn trace(self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, args);
    }

    pub fn debug(self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn error(self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::handler::{LogHandler, LogSink};
    use crate::core::model::CategoryOverride;
    use crate::core::sink::StreamSink;
    use crate::platform::stream::MemoryStream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured {
        records: Arc<Mutex<Vec<(String, Level, Option<String>, LogAttributes)>>>,
    }

    impl LogSink for Captured {
        fn log_message(&self, msg: &str, level: Level, category: Option<&str>, attr: &LogAttributes) {
            self.records.lock().unwrap().push((
                msg.to_string(),
                level,
                category.map(str::to_string),
                attr.clone(),
            ));
        }
    }

    fn setup(level: Level) -> (LogManager, Arc<LogHandler>, Captured) {
        let manager = LogManager::new();
        let cap = Captured::default();
        let handler = Arc::new(LogHandler::with_filters(
            cap.clone(),
            level,
            &[CategoryOverride::new("quiet", Level::Error)],
        ));
        manager.add_handler(&handler).unwrap();
        (manager, handler, cap)
    }

    #[test]
    fn test_levels_and_category() {
        let (manager, _handler, cap) = setup(Level::Info);
        let log = Logger::with_manager("app.net", &manager);

        log.debug(format_args!("hidden"));
        log.info(format_args!("port {}", 8080));
        log.error(format_args!("boom"));

        let records = cap.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, "port 8080");
        assert_eq!(records[0].2.as_deref(), Some("app.net"));
        assert_eq!(records[1].1, Level::Error);
    }

    #[test]
    fn test_is_enabled_follows_category_override() {
        let (manager, _handler, _) = setup(Level::Debug);
        let quiet = Logger::with_manager("quiet.sub", &manager);
        let loud = Logger::with_manager("loud", &manager);

        assert!(!quiet.is_warn_enabled());
        assert!(quiet.is_error_enabled());
        assert!(loud.is_debug_enabled());
        assert!(!loud.is_trace_enabled());
        assert!(loud.is_info_enabled());
    }

    #[test]
    fn test_disabled_message_is_not_formatted() {
        struct Counted<'a>(&'a AtomicUsize);
        impl fmt::Display for Counted<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fetch_add(1, Ordering::SeqCst);
                f.write_str("x")
            }
        }

        let (manager, _handler, _) = setup(Level::Warn);
        let log = Logger::with_manager("a", &manager);
        let calls = AtomicUsize::new(0);
        log.debug(format_args!("{}", Counted(&calls)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        log.warn(format_args!("{}", Counted(&calls)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_attributes_attach_to_one_message() {
        let (manager, _handler, cap) = setup(Level::Trace);
        let log = Logger::with_manager("", &manager);

        log.code(-5)
            .details("refused")
            .at("src/net.rs", 10)
            .function("connect")
            .warn(format_args!("failed"));
        log.info(format_args!("plain"));

        let records = cap.records.lock().unwrap();
        assert_eq!(records[0].2, None);
        assert_eq!(records[0].3.code, Some(-5));
        assert_eq!(records[0].3.details.as_deref(), Some("refused"));
        assert_eq!(records[0].3.line, Some(10));
        assert!(records[1].3.is_empty());
    }

    #[test]
    fn test_print_write_and_dump_are_raw() {
        let manager = LogManager::new();
        let mem = Arc::new(MemoryStream::new());
        let handler = Arc::new(LogHandler::new(StreamSink::new(mem.clone()), Level::Info));
        manager.add_handler(&handler).unwrap();
        let log = Logger::with_manager("raw", &manager);

        log.print("text ");
        log.write(b"bytes ");
        log.dump(&[0x00, 0xab, 0x7f]);
        log.dump_at(Level::Debug, &[0xff]);
        assert_eq!(mem.text(), "text bytes 00ab7f");
    }

    #[test]
    fn test_default_logger_uses_default_category() {
        let log = Logger::default();
        assert_eq!(log.name(), constants::DEFAULT_CATEGORY);
    }
}
