//! Frame codec: a 4-byte big-endian length followed by that many bytes of UTF-8 JSON.
//!
//! The same framing is used in both directions.

use std::str::FromStr;

use serde_json::Map;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::types::Command;
use crate::types::Request;
use crate::types::Response;

pub const LENGTH_PREFIX_BYTES: usize = 4;

/// Largest response body the client will accept (1 MiB).
pub const MAX_RESPONSE_BYTES: u32 = 1024 * 1024;

/// Keys the envelope itself uses; a flattened param may not take them.
const RESERVED_KEYS: [&str; 2] = ["command", "params"];

/// How a request's params are laid out in the JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Envelope {
    /// `{"command": "CLICK", "params": {"id": ...}}`
    #[default]
    Nested,
    /// `{"command": "CLICK", "id": ...}`, spoken by older backends.
    Flattened,
}

impl FromStr for Envelope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(Envelope::Nested),
            "flat" | "flattened" => Ok(Envelope::Flattened),
            other => Err(format!("unknown envelope '{other}'")),
        }
    }
}

/// Serializes `request` and prefixes it with its byte length.
pub fn encode(request: &Request, envelope: Envelope) -> Result<Vec<u8>, ProtocolError> {
    let payload = match envelope {
        Envelope::Nested => serde_json::to_vec(request).map_err(ProtocolError::Encode)?,
        Envelope::Flattened => {
            let mut object = Map::new();
            object.insert(
                "command".to_string(),
                Value::from(request.command.as_str()),
            );
            for (key, value) in &request.params {
                if RESERVED_KEYS.contains(&key.as_str()) {
                    return Err(ProtocolError::MalformedPayload(format!(
                        "param '{key}' collides with the flattened envelope"
                    )));
                }
                object.insert(key.clone(), value.clone());
            }
            serde_json::to_vec(&Value::Object(object)).map_err(ProtocolError::Encode)?
        }
    };
    frame_payload(payload)
}

/// Frames a response; used by backends and test doubles.
pub fn encode_response(response: &Response) -> Result<Vec<u8>, ProtocolError> {
    let payload = serde_json::to_vec(response).map_err(ProtocolError::Encode)?;
    frame_payload(payload)
}

/// Prefixes an already-serialized payload with its big-endian length.
pub fn frame_payload(payload: Vec<u8>) -> Result<Vec<u8>, ProtocolError> {
    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::FrameTooLarge { len: payload.len() })?;
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_BYTES + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Reads the length prefix. Size limits are the caller's concern.
pub fn decode_response_header(header: [u8; LENGTH_PREFIX_BYTES]) -> u32 {
    u32::from_be_bytes(header)
}

pub fn decode_response_body(body: &[u8]) -> Result<Response, ProtocolError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| ProtocolError::MalformedPayload(format!("invalid UTF-8: {e}")))?;
    serde_json::from_str(text).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))
}

/// Decodes a request body in either envelope. A body with a `params` object
/// must carry nothing else besides `command`; a body without one is read as
/// flattened, every key except `command` becoming a param.
pub fn decode_request_body(body: &[u8]) -> Result<Request, ProtocolError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| ProtocolError::MalformedPayload(format!("invalid UTF-8: {e}")))?;
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))?;
    let Value::Object(mut object) = value else {
        return Err(ProtocolError::MalformedPayload(
            "request is not a JSON object".to_string(),
        ));
    };

    let command = object
        .remove("command")
        .and_then(|c| c.as_str().and_then(|s| s.parse::<Command>().ok()))
        .ok_or_else(|| ProtocolError::MalformedPayload("missing or unknown command".to_string()))?;

    let params = match object.remove("params") {
        Some(Value::Object(_)) if !object.is_empty() => {
            return Err(ProtocolError::MalformedPayload(
                "nested params mixed with top-level params".to_string(),
            ));
        }
        Some(Value::Object(params)) => params,
        Some(other) => {
            return Err(ProtocolError::MalformedPayload(format!(
                "params must be an object, got {other}"
            )));
        }
        None => object,
    };

    Ok(Request::new(command, params))
}
