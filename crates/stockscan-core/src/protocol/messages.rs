//! Message types for the WebView bridge protocol.
//!
//! Every message on the wire is a JSON object with a `"type"` field naming one
//! of five message types, plus an optional `"payload"`:
//!
//! ```json
//! {"type":"SCAN_RFID"}
//! {"type":"RFID_RESULT","payload":{"epc":"E2801170000002015B8E5B5B","tid":"123456","rssi":-50,"timestamp":1700000000000}}
//! ```
//!
//! # Typed payloads over an untyped envelope
//!
//! The bridge itself never looks inside `payload`: a message is valid as soon
//! as its `type` is known.  [`Message`] therefore carries the payload as an
//! opaque [`serde_json::Value`].
//!
//! Application code should not have to deal with raw JSON, though.  Each
//! payload struct implements [`Payload`], which ties it to exactly one
//! [`MessageType`].  [`Message::from_payload`] and [`Message::payload_as`]
//! use that association so that a `RFID_RESULT` handler can only ever be
//! written against [`RfidScanResult`].
//!
//! # Direction
//!
//! | Type             | Conventional sender |
//! |------------------|---------------------|
//! | `SCAN_RFID`      | hosted page         |
//! | `STOP_SCAN`      | hosted page         |
//! | `RFID_RESULT`    | native shell        |
//! | `RFID_ERROR`     | native shell        |
//! | `SCANNER_STATUS` | native shell        |
//!
//! Direction is a convention only.  See [`crate::protocol::policy`].

use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::protocol::policy::Peer;

// ── Message type ──────────────────────────────────────────────────────────────

/// The closed set of message types understood by both bridges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Hosted page asks the shell to start scanning.
    ScanRfid,
    /// Hosted page asks the shell to stop scanning.
    StopScan,
    /// Shell delivers a tag read by the scanner.
    RfidResult,
    /// Shell reports a scanning failure.
    RfidError,
    /// Shell pushes a snapshot of the scanner hardware state.
    ScannerStatus,
}

impl MessageType {
    /// Every known message type, in contract order.
    pub const ALL: [MessageType; 5] = [
        MessageType::ScanRfid,
        MessageType::StopScan,
        MessageType::RfidResult,
        MessageType::RfidError,
        MessageType::ScannerStatus,
    ];

    /// Returns the wire name of this type (e.g. `"SCAN_RFID"`).
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::ScanRfid => "SCAN_RFID",
            MessageType::StopScan => "STOP_SCAN",
            MessageType::RfidResult => "RFID_RESULT",
            MessageType::RfidError => "RFID_ERROR",
            MessageType::ScannerStatus => "SCANNER_STATUS",
        }
    }

    /// Looks up a type by its wire name.  Matching is case-sensitive.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// The peer that sends this type by convention.
    pub fn conventional_sender(self) -> Peer {
        match self {
            MessageType::ScanRfid | MessageType::StopScan => Peer::Hosted,
            MessageType::RfidResult | MessageType::RfidError | MessageType::ScannerStatus => {
                Peer::Host
            }
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// A validated bridge message: a known type plus an opaque payload.
///
/// Messages are transient.  They are built, serialized, handed to a
/// transport and forgotten; nothing is retried or persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The message type (`"type"` on the wire).
    #[serde(rename = "type")]
    pub message_type: MessageType,

    /// Type-specific payload.  Omitted from the JSON when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Message {
    /// Creates a message without a payload.
    pub fn new(message_type: MessageType) -> Self {
        Self {
            message_type,
            payload: None,
        }
    }

    /// Creates a message carrying an arbitrary JSON payload.
    pub fn with_payload(message_type: MessageType, payload: Value) -> Self {
        Self {
            message_type,
            payload: Some(payload),
        }
    }

    /// Creates a message from a typed payload; the type comes from `P`.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Encode`] if the payload cannot be represented
    /// as JSON.
    pub fn from_payload<P: Payload>(payload: &P) -> Result<Self, PayloadError> {
        let value = serde_json::to_value(payload).map_err(|source| PayloadError::Encode {
            message_type: P::MESSAGE_TYPE,
            source,
        })?;
        Ok(Self::with_payload(P::MESSAGE_TYPE, value))
    }

    /// Interprets the payload as `P`.
    ///
    /// # Errors
    ///
    /// - [`PayloadError::TypeMismatch`] if this message is not of
    ///   `P::MESSAGE_TYPE`.
    /// - [`PayloadError::Decode`] if the payload does not have `P`'s shape.
    pub fn payload_as<P: Payload>(&self) -> Result<P, PayloadError> {
        if self.message_type != P::MESSAGE_TYPE {
            return Err(PayloadError::TypeMismatch {
                expected: P::MESSAGE_TYPE,
                actual: self.message_type,
            });
        }
        decode_payload(self.payload.as_ref())
    }
}

// ── Typed payloads ────────────────────────────────────────────────────────────

/// A payload shape bound to exactly one message type.
pub trait Payload: Serialize + DeserializeOwned {
    /// The message type that carries this payload.
    const MESSAGE_TYPE: MessageType;
}

/// Errors raised while converting between typed payloads and JSON.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The message carries a different type than the payload expects.
    #[error("payload for {expected} requested from a {actual} message")]
    TypeMismatch {
        expected: MessageType,
        actual: MessageType,
    },

    /// The JSON payload does not match the expected shape.
    #[error("malformed {message_type} payload: {source}")]
    Decode {
        message_type: MessageType,
        #[source]
        source: serde_json::Error,
    },

    /// The payload could not be turned into JSON.
    #[error("failed to encode {message_type} payload: {source}")]
    Encode {
        message_type: MessageType,
        #[source]
        source: serde_json::Error,
    },
}

/// Decodes a raw payload as `P`.  An absent payload is decoded from `null`.
///
/// # Errors
///
/// Returns [`PayloadError::Decode`] if the value does not have `P`'s shape.
pub fn decode_payload<P: Payload>(payload: Option<&Value>) -> Result<P, PayloadError> {
    let value = payload.unwrap_or(&Value::Null);
    P::deserialize(value).map_err(|source| PayloadError::Decode {
        message_type: P::MESSAGE_TYPE,
        source,
    })
}

/// Result of a single RFID tag read (`RFID_RESULT` payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfidScanResult {
    /// Electronic Product Code; the key used to match a product.
    pub epc: String,
    /// Tag identifier, when the reader reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
    /// Received signal strength in dBm.  Fractional readings are rounded.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "rounded_rssi"
    )]
    pub rssi: Option<i32>,
    /// Capture time in milliseconds since the Unix epoch.
    #[serde(deserialize_with = "rounded_timestamp")]
    pub timestamp: u64,
}

// Readers and JS peers send plain numbers; an integer field must still
// accept `-50.5` or `1700000000000.0`.
fn rounded(n: &Number) -> Option<f64> {
    n.as_f64().filter(|f| f.is_finite()).map(f64::round)
}

fn rounded_rssi<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    let Some(n) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(v) = n.as_i64() {
        return i32::try_from(v)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("rssi {v} out of range")));
    }
    match rounded(&n) {
        Some(f) if f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) => Ok(Some(f as i32)),
        _ => Err(D::Error::custom(format!("rssi {n} out of range"))),
    }
}

fn rounded_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let n = Number::deserialize(deserializer)?;
    if let Some(v) = n.as_u64() {
        return Ok(v);
    }
    match rounded(&n) {
        Some(f) if f >= 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(D::Error::custom(format!("timestamp {n} out of range"))),
    }
}

impl RfidScanResult {
    /// Creates a result for `epc` stamped with the current time.
    pub fn captured_now(epc: impl Into<String>) -> Self {
        Self {
            epc: epc.into(),
            tid: None,
            rssi: None,
            timestamp: crate::domain::unix_millis(),
        }
    }
}

impl Payload for RfidScanResult {
    const MESSAGE_TYPE: MessageType = MessageType::RfidResult;
}

/// Error report from the scanner (`RFID_ERROR` payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfidErrorPayload {
    /// Human-readable description.
    pub message: String,
    /// Machine-readable code such as `"SCANNER_ERROR"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Free-form context from the reader, relayed untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl RfidErrorPayload {
    /// Code sent when no scanner hardware is present.
    pub const SCANNER_ERROR: &'static str = "SCANNER_ERROR";
    /// Code sent when the hardware refused to start or stop.
    pub const SCAN_FAILED: &'static str = "SCAN_FAILED";

    pub fn new(message: impl Into<String>, code: Option<&str>) -> Self {
        Self {
            message: message.into(),
            code: code.map(str::to_string),
            details: None,
        }
    }

    /// Attaches reader-specific context.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// The error sent when scanning is requested on a device without a reader.
    pub fn scanner_not_available() -> Self {
        Self::new("Scanner not available", Some(Self::SCANNER_ERROR))
    }
}

impl Payload for RfidErrorPayload {
    const MESSAGE_TYPE: MessageType = MessageType::RfidError;
}

/// Snapshot of the scanner hardware state (`SCANNER_STATUS` payload).
///
/// Older shells emitted `isReady` / `isScanning`; both spellings are accepted
/// on input, only `available` / `scanning` are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerStatus {
    /// Whether scanning hardware is present and usable.
    #[serde(alias = "isReady")]
    pub available: bool,
    /// Whether a scan is in progress.
    #[serde(alias = "isScanning")]
    pub scanning: bool,
    /// Last hardware error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Payload for ScannerStatus {
    const MESSAGE_TYPE: MessageType = MessageType::ScannerStatus;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
