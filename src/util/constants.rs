// LogWire - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

use crate::core::model::Level;

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogWire";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "LogWire";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Registry limits
// =============================================================================

/// Default maximum number of active handlers (external + named) in one manager.
///
/// Handler lists on device are on the order of a handful of entries; the cap
/// keeps a misbehaving controller from growing the registry without bound.
pub const DEFAULT_MAX_ACTIVE_HANDLERS: usize = 16;

/// Minimum configurable active-handler cap.
pub const MIN_MAX_ACTIVE_HANDLERS: usize = 1;

/// Hard upper bound on the active-handler cap.
pub const ABSOLUTE_MAX_ACTIVE_HANDLERS: usize = 64;

/// Handlers held inline in the per-dispatch snapshot before spilling to the heap.
pub const DISPATCH_INLINE_HANDLERS: usize = 8;

/// Default level for handlers created without an explicit level.
pub const DEFAULT_HANDLER_LEVEL: Level = Level::Info;

// =============================================================================
// Configuration protocol
// =============================================================================

/// Version of the JSON configuration request/reply schema.
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum accepted size of a single configuration request in bytes.
pub const MAX_REQUEST_SIZE: usize = 16 * 1024; // 16 KB

/// Default reply buffer capacity in bytes.
pub const DEFAULT_REPLY_CAPACITY: usize = 1024;

/// Minimum configurable reply buffer capacity in bytes.
pub const MIN_REPLY_CAPACITY: usize = 64;

/// Maximum configurable reply buffer capacity in bytes.
pub const MAX_REPLY_CAPACITY: usize = 64 * 1024; // 64 KB

// =============================================================================
// Built-in factory type names
// =============================================================================

/// Handler type rendering human-readable text lines.
pub const HANDLER_TYPE_STREAM: &str = "stream";

/// Handler type rendering one JSON object per line.
pub const HANDLER_TYPE_JSON: &str = "json";

/// Stream type writing to the process stdout.
pub const STREAM_TYPE_STDOUT: &str = "stdout";

/// Stream type writing to the process stderr.
pub const STREAM_TYPE_STDERR: &str = "stderr";

/// Stream type writing to a file (`params.path`, optional `params.append`).
pub const STREAM_TYPE_FILE: &str = "file";

// =============================================================================
// Logger front end
// =============================================================================

/// Category used by a `Logger` constructed without an explicit name.
pub const DEFAULT_CATEGORY: &str = "app";

/// Level used by `Logger::print`, `Logger::write` and `Logger::dump`.
pub const DEFAULT_MESSAGE_LEVEL: Level = Level::Info;

// =============================================================================
// Logging
// =============================================================================

/// Default diagnostic log level for the crate's own tracing output.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
