// LogWire - core/protocol.rs
//
// Wire schema (version 1) of the remote configuration channel and its JSON
// codec. Core layer: bytes in, typed commands out; replies are encoded into a
// caller-supplied buffer and never exceed it.
//
// Request shapes:
//   {"v":1,"cmd":"add_handler","id":"uart","handler":{"type":"stream"},
//    "stream":{"type":"file","params":{"path":"/tmp/x.log"}},
//    "level":"warn","filters":[{"category":"app.net","level":"trace"}]}
//   {"v":1,"cmd":"remove_handler","id":"uart"}
//   {"v":1,"cmd":"enum_handlers"}
//
// Reply shapes:
//   {"v":1,"ok":true}
//   {"v":1,"ok":false,"error":"..."}
//   {"v":1,"ok":true,"ids":["a","b"],"truncated":true}

use crate::core::model::{CategoryOverride, Level};
use crate::util::constants::{DEFAULT_HANDLER_LEVEL, MAX_REQUEST_SIZE, PROTOCOL_VERSION};
use crate::util::error::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Encoding of configuration requests and replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum DataFormat {
    #[default]
    Json,
}

/// A `{"type": ..., "params": ...}` pair naming a factory product.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TypeSpec {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub params: Value,
}

/// Arguments of `add_handler`, shared by the wire protocol and config.toml.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NamedHandlerConfig {
    pub id: String,
    pub handler: TypeSpec,
    #[serde(default)]
    pub stream: Option<TypeSpec>,
    #[serde(default = "default_level")]
    pub level: Level,
    #[serde(default)]
    pub filters: Vec<CategoryOverride>,
}

fn default_level() -> Level {
    DEFAULT_HANDLER_LEVEL
}

/// A decoded configuration command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ConfigCommand {
    AddHandler(NamedHandlerConfig),
    RemoveHandler { id: String },
    EnumHandlers,
}

/// Decode a request buffer into a command.
///
/// The `v` field is optional and defaults to the current version; any other
/// version is rejected so a newer controller never has its commands
/// half-understood.
pub fn decode_request(request: &[u8], format: DataFormat) -> Result<ConfigCommand, ProtocolError> {
    match format {
        DataFormat::Json => decode_json(request),
    }
}

fn decode_json(request: &[u8]) -> Result<ConfigCommand, ProtocolError> {
    if request.len() > MAX_REQUEST_SIZE {
        return Err(ProtocolError::RequestTooLarge {
            size: request.len(),
            max: MAX_REQUEST_SIZE,
        });
    }

    let mut value: Value =
        serde_json::from_slice(request).map_err(|e| ProtocolError::Malformed { source: e })?;

    if let Some(obj) = value.as_object_mut() {
        if let Some(v) = obj.remove("v") {
            match v.as_u64() {
                Some(found) if found == u64::from(PROTOCOL_VERSION) => {}
                Some(found) => {
                    return Err(ProtocolError::UnsupportedVersion {
                        found,
                        supported: PROTOCOL_VERSION,
                    })
                }
                None => {
                    return Err(ProtocolError::Malformed {
                        source: serde::de::Error::custom("field 'v' must be an unsigned integer"),
                    })
                }
            }
        }
    }

    serde_json::from_value(value).map_err(|e| ProtocolError::Malformed { source: e })
}

/// Outcome of a command, ready to be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigReply {
    /// Command applied (or failed) with no payload.
    Status { ok: bool, error: Option<String> },
    /// Ids of the current named handlers.
    HandlerIds(Vec<String>),
}

#[derive(Serialize)]
struct ReplyFrame<'a> {
    v: u32,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    truncated: bool,
}

/// Encode a reply into `buf`, returning the number of bytes written.
///
/// An id list that does not fit is shortened from the end and flagged
/// `truncated`; an error message that does not fit is dropped. If not even
/// the bare status fits, nothing is written and `ReplyTooSmall` is returned.
pub fn encode_reply(
    reply: &ConfigReply,
    buf: &mut [u8],
    format: DataFormat,
) -> Result<usize, ProtocolError> {
    match format {
        DataFormat::Json => encode_json(reply, buf),
    }
}

fn encode_json(reply: &ConfigReply, buf: &mut [u8]) -> Result<usize, ProtocolError> {
    let encode = |frame: &ReplyFrame<'_>| {
        serde_json::to_vec(frame).map_err(|e| ProtocolError::Encode { source: e })
    };

    let bytes = match reply {
        ConfigReply::Status { ok, error } => {
            let full = encode(&ReplyFrame {
                v: PROTOCOL_VERSION,
                ok: *ok,
                error: error.as_deref(),
                ids: None,
                truncated: false,
            })?;
            if full.len() <= buf.len() || error.is_none() {
                full
            } else {
                encode(&ReplyFrame {
                    v: PROTOCOL_VERSION,
                    ok: *ok,
                    error: None,
                    ids: None,
                    truncated: true,
                })?
            }
        }
        ConfigReply::HandlerIds(ids) => {
            let mut kept = ids.len();
            loop {
                let frame = encode(&ReplyFrame {
                    v: PROTOCOL_VERSION,
                    ok: true,
                    error: None,
                    ids: Some(&ids[..kept]),
                    truncated: kept < ids.len(),
                })?;
                if frame.len() <= buf.len() || kept == 0 {
                    break frame;
                }
                kept -= 1;
            }
        }
    };

    if bytes.len() > buf.len() {
        return Err(ProtocolError::ReplyTooSmall {
            needed: bytes.len(),
            capacity: buf.len(),
        });
    }
    buf[..bytes.len()].copy_from_slice(&bytes);
    Ok(bytes.len())
}
