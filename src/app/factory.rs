// LogWire - app/factory.rs
//
// Pluggable creators of handlers and output streams, addressed by type name.
// The manager tries registered factories in registration order and uses the
// first one that produces something; a factory that does not recognise a
// type returns `None`.
//
// Built-ins:
//   - `DefaultHandlerFactory`: "stream" (text lines) and "json" (JSON lines).
//   - `DefaultStreamFactory`: "stdout", "stderr" and "file".

use crate::core::handler::{LogHandler, OutputStream};
use crate::core::model::{CategoryOverride, Level};
use crate::core::sink::{JsonSink, StreamSink};
use crate::platform::stream::{FileStream, Stdio, StdioStream};
use crate::util::constants;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Creates and destroys handlers by type name.
///
/// Both methods run without the manager's registry lock held, so they may
/// take their time or call back into the `LogManager`.
pub trait HandlerFactory: Send + Sync {
    /// Build a handler of `handler_type`, or `None` if this factory does not
    /// know the type or the parameters are unusable.
    fn create_handler(
        &self,
        handler_type: &str,
        params: &Value,
        stream: Option<Arc<dyn OutputStream>>,
        level: Level,
        filters: &[CategoryOverride],
    ) -> Option<LogHandler>;

    /// Release a handler created by this factory. Default drops it.
    fn destroy_handler(&self, handler: Arc<LogHandler>) {
        drop(handler);
    }
}

/// Creates and destroys output streams by type name.
///
/// Same locking rules as `HandlerFactory`.
pub trait StreamFactory: Send + Sync {
    /// Build a stream of `stream_type`, or `None` if unknown or unusable.
    fn create_stream(&self, stream_type: &str, params: &Value) -> Option<Arc<dyn OutputStream>>;

    /// Release a stream created by this factory. Default flushes and drops it.
    fn destroy_stream(&self, stream: Arc<dyn OutputStream>) {
        stream.flush();
    }
}

/// Factory for the built-in text and JSON handlers. Both need a stream.
#[derive(Debug, Default)]
pub struct DefaultHandlerFactory;

impl HandlerFactory for DefaultHandlerFactory {
    fn create_handler(
        &self,
        handler_type: &str,
        _params: &Value,
        stream: Option<Arc<dyn OutputStream>>,
        level: Level,
        filters: &[CategoryOverride],
    ) -> Option<LogHandler> {
        match handler_type {
            constants::HANDLER_TYPE_STREAM => Some(LogHandler::with_filters(
                StreamSink::new(stream?),
                level,
                filters,
            )),
            constants::HANDLER_TYPE_JSON => Some(LogHandler::with_filters(
                JsonSink::new(stream?),
                level,
                filters,
            )),
            _ => None,
        }
    }
}

/// Factory for the built-in stdio and file streams.
#[derive(Debug, Default)]
pub struct DefaultStreamFactory;

impl StreamFactory for DefaultStreamFactory {
    fn create_stream(&self, stream_type: &str, params: &Value) -> Option<Arc<dyn OutputStream>> {
        match stream_type {
            constants::STREAM_TYPE_STDOUT => Some(Arc::new(StdioStream::new(Stdio::Stdout))),
            constants::STREAM_TYPE_STDERR => Some(Arc::new(StdioStream::new(Stdio::Stderr))),
            constants::STREAM_TYPE_FILE => {
                let Some(path) = params.get("path").and_then(Value::as_str) else {
                    tracing::warn!("File stream requested without a 'path' parameter");
                    return None;
                };
                let append = params.get("append").and_then(Value::as_bool).unwrap_or(true);
                match FileStream::open(Path::new(path), append) {
                    Ok(stream) => Some(Arc::new(stream)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not create file stream");
                        None
                    }
                }
            }
            _ => None,
        }
    }
}
