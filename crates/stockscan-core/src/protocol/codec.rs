//! JSON codec and validation for bridge messages.
//!
//! Wire format: a UTF-8 JSON object `{"type": <string>, "payload"?: <any>}`.
//!
//! # Validation
//!
//! ```text
//! validate(msg):
//!   msg is not an object               → NotAnObject
//!   msg.type absent or not a string    → MissingType
//!   msg.type not one of the five types → UnknownType
//!   otherwise                          → valid
//! ```
//!
//! The payload is never inspected.  There are no size limits and no schema
//! version; the bridge is an envelope check, not a schema validator.
//!
//! # Script injection
//!
//! The native shell can only reach the page by asking the browser surface to
//! run a script.  [`injection_script`] wraps an encoded message in a guarded
//! IIFE that re-posts it on the page's `window`, and
//! [`extract_injected_payload`] recovers the JSON from such a script for
//! in-process surfaces that emulate a browser.

use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{Message, MessageType, PayloadError};
use crate::protocol::policy::Direction;

/// Why a value is not a valid bridge message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The value is `null`, a primitive, or an array.
    #[error("message is not a JSON object")]
    NotAnObject,

    /// The `type` field is missing or not a string.
    #[error("message has no string `type` field")]
    MissingType,

    /// The `type` field names a type outside the contract.
    #[error("unknown message type: {0:?}")]
    UnknownType(String),
}

/// Every failure the bridges can report.
///
/// Bridges never panic on these; each one is logged through `tracing` and
/// also returned so callers can observe it.  All of them are terminal: the
/// message is dropped and never retried.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The transport text is not parseable JSON.
    #[error("malformed message payload: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The JSON parsed but fails the envelope check.
    #[error("invalid message format: {0}")]
    Invalid(#[from] ValidationError),

    /// The message could not be turned into transport text.
    #[error("failed to serialize message: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A typed payload could not be converted to JSON.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// No transport is available (no live surface, no bridging primitive).
    #[error("transport unavailable: {0}")]
    TransportUnavailable(&'static str),

    /// The transport rejected the message.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The peer's direction policy does not allow this type.
    #[error("{message_type} is not allowed {direction} on this peer")]
    DirectionNotAllowed {
        message_type: MessageType,
        direction: Direction,
    },
}

// ── Validation ────────────────────────────────────────────────────────────────

/// Checks the envelope of `value` and returns its message type.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use stockscan_core::protocol::{validate, MessageType, ValidationError};
///
/// assert_eq!(validate(&json!({"type": "SCAN_RFID"})), Ok(MessageType::ScanRfid));
/// assert_eq!(validate(&json!(42)), Err(ValidationError::NotAnObject));
/// ```
pub fn validate(value: &Value) -> Result<MessageType, ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;
    let name = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingType)?;
    MessageType::from_wire(name).ok_or_else(|| ValidationError::UnknownType(name.to_string()))
}

/// Boolean form of [`validate`].  `None` stands for an absent value.
pub fn is_valid(value: Option<&Value>) -> bool {
    value.is_some_and(|v| validate(v).is_ok())
}

/// Validates `value` and turns it into a [`Message`].
///
/// A `null` payload is treated the same as an absent one.
///
/// # Errors
///
/// Returns [`ValidationError`] if the envelope check fails.
pub fn message_from_value(value: Value) -> Result<Message, ValidationError> {
    let message_type = validate(&value)?;
    let payload = match value {
        Value::Object(mut object) => object.remove("payload").filter(|p| !p.is_null()),
        _ => None,
    };
    Ok(Message {
        message_type,
        payload,
    })
}

// ── Encoding / decoding ───────────────────────────────────────────────────────

/// Parses transport text into a validated [`Message`].
///
/// # Errors
///
/// - [`BridgeError::Malformed`] if `text` is not JSON.
/// - [`BridgeError::Invalid`] if the JSON fails the envelope check.
pub fn decode_text(text: &str) -> Result<Message, BridgeError> {
    let value: Value = serde_json::from_str(text).map_err(BridgeError::Malformed)?;
    Ok(message_from_value(value)?)
}

/// Serializes a message to compact JSON.
///
/// Field order follows the declaration order of the payload structs, so the
/// output of typed payloads is stable.
///
/// # Errors
///
/// Returns [`BridgeError::Serialize`] if serialization fails.
pub fn encode(message: &Message) -> Result<String, BridgeError> {
    serde_json::to_string(message).map_err(BridgeError::Serialize)
}

// ── Script injection ──────────────────────────────────────────────────────────

const POST_PREFIX: &str = "window.postMessage(";
const POST_SUFFIX: &str = ", '*');";

/// Builds the script the shell asks the browser surface to run.
///
/// `json` must be the output of [`encode`].  U+2028 and U+2029 are legal in
/// JSON strings but terminate lines in older JavaScript engines, so they are
/// escaped.
pub fn injection_script(json: &str) -> String {
    let literal = json.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029");
    format!(
        "(function() {{\n  try {{\n    {POST_PREFIX}{literal}{POST_SUFFIX}\n  }} catch (error) {{\n    console.error('Failed to receive message from native shell:', error);\n  }}\n}})();\ntrue;"
    )
}

/// Recovers the JSON literal embedded by [`injection_script`].
///
/// Returns `None` if `script` was not produced by [`injection_script`].
pub fn extract_injected_payload(script: &str) -> Option<&str> {
    let start = script.find(POST_PREFIX)? + POST_PREFIX.len();
    let end = script.rfind(POST_SUFFIX)?;
    (start <= end).then(|| &script[start..end])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
