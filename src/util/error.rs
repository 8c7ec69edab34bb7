// LogWire - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every failure in the log core is local and recoverable; nothing here is
// meant to terminate the process.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LogWire operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogWireError {
    /// Handler registry operation was rejected.
    Registry(RegistryError),

    /// Configuration request could not be decoded or answered.
    Protocol(ProtocolError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for LogWireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(e) => write!(f, "Registry error: {e}"),
            Self::Protocol(e) => write!(f, "Protocol error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LogWireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Registry(e) => Some(e),
            Self::Protocol(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

/// Reasons a registry mutation was rejected.
///
/// All variants are configuration or resource errors: the registry is left
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The handler is already in the active list.
    AlreadyRegistered,

    /// The active-handler list is full.
    CapacityExceeded { max: usize },

    /// The same factory instance is already registered.
    DuplicateFactory,

    /// A named handler with this id already exists.
    DuplicateId { id: String },

    /// No registered stream factory accepted the stream type.
    UnknownStreamType { stream_type: String },

    /// No registered handler factory accepted the handler type.
    UnknownHandlerType { handler_type: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRegistered => write!(f, "Handler is already registered"),
            Self::CapacityExceeded { max } => {
                write!(f, "Active handler limit of {max} reached")
            }
            Self::DuplicateFactory => write!(f, "Factory is already registered"),
            Self::DuplicateId { id } => {
                write!(f, "Named handler '{id}' already exists; remove it first")
            }
            Self::UnknownStreamType { stream_type } => {
                write!(f, "No stream factory accepts type '{stream_type}'")
            }
            Self::UnknownHandlerType { handler_type } => {
                write!(f, "No handler factory accepts type '{handler_type}'")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<RegistryError> for LogWireError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Errors raised while decoding a configuration request or encoding its reply.
#[derive(Debug)]
pub enum ProtocolError {
    /// Request exceeds the maximum accepted size.
    RequestTooLarge { size: usize, max: usize },

    /// Request is not valid JSON or does not match any command shape.
    Malformed { source: serde_json::Error },

    /// Request carries a schema version this build does not speak.
    UnsupportedVersion { found: u64, supported: u32 },

    /// Even the minimal reply does not fit the caller's buffer.
    ReplyTooSmall { needed: usize, capacity: usize },

    /// Reply serialisation failed.
    Encode { source: serde_json::Error },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestTooLarge { size, max } => write!(
                f,
                "Request is {size} bytes, exceeds maximum of {max} bytes"
            ),
            Self::Malformed { source } => write!(f, "Malformed request: {source}"),
            Self::UnsupportedVersion { found, supported } => write!(
                f,
                "Unsupported protocol version {found} (this build speaks version {supported})"
            ),
            Self::ReplyTooSmall { needed, capacity } => write!(
                f,
                "Reply needs at least {needed} bytes but the buffer holds {capacity}"
            ),
            Self::Encode { source } => write!(f, "Failed to encode reply: {source}"),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed { source } => Some(source),
            Self::Encode { source } => Some(source),
            _ => None,
        }
    }
}

impl From<ProtocolError> for LogWireError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogWireError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for LogWire results.
pub type Result<T> = std::result::Result<T, LogWireError>;
