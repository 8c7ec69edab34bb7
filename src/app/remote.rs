// LogWire - app/remote.rs
//
// Remote configuration processor: decodes a request, applies it to a
// `LogManager`, and encodes the reply into the caller's buffer. Transport
// (serial line, socket, stdin) is the caller's concern.

use crate::app::manager::LogManager;
use crate::core::protocol::{decode_request, encode_reply, ConfigCommand, ConfigReply, DataFormat};
use crate::util::error::ProtocolError;

/// Apply a decoded command to `manager`.
///
/// Removing an unknown id is not an error: the reply is still `ok`.
pub fn apply_command(manager: &LogManager, command: &ConfigCommand) -> ConfigReply {
    match command {
        ConfigCommand::AddHandler(config) => match manager.add_named_handler(config) {
            Ok(()) => ConfigReply::Status {
                ok: true,
                error: None,
            },
            Err(e) => ConfigReply::Status {
                ok: false,
                error: Some(e.to_string()),
            },
        },
        ConfigCommand::RemoveHandler { id } => {
            manager.remove_named_handler(id);
            ConfigReply::Status {
                ok: true,
                error: None,
            }
        }
        ConfigCommand::EnumHandlers => ConfigReply::HandlerIds(manager.named_handler_ids()),
    }
}

/// Result of processing one configuration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigOutcome {
    /// Bytes of reply written into the caller's buffer.
    pub len: usize,
    /// False if the request was rejected or its command failed.
    pub ok: bool,
}

/// Process one configuration request and write the reply into `reply`.
///
/// A request that cannot be decoded still gets an `ok: false` reply so the
/// controller learns why, and the returned `ok` is false as well. Only a
/// reply buffer too small for even a bare status is reported as an error.
pub fn process_config_request(
    manager: &LogManager,
    request: &[u8],
    reply: &mut [u8],
    format: DataFormat,
) -> Result<ConfigOutcome, ProtocolError> {
    let outcome = match decode_request(request, format) {
        Ok(command) => {
            tracing::debug!(?command, "Config request");
            apply_command(manager, &command)
        }
        Err(e) => {
            tracing::warn!(error = %e, len = request.len(), "Rejected config request");
            ConfigReply::Status {
                ok: false,
                error: Some(e.to_string()),
            }
        }
    };
    let ok = match &outcome {
        ConfigReply::Status { ok, .. } => *ok,
        ConfigReply::HandlerIds(_) => true,
    };
    let len = encode_reply(&outcome, reply, format)?;
    Ok(ConfigOutcome { len, ok })
}
