//! Protocol module containing the message contract, the JSON codec, the
//! handler registry and the direction policy.

pub mod codec;
pub mod messages;
pub mod policy;
pub mod registry;

pub use codec::{
    decode_text, encode, extract_injected_payload, injection_script, is_valid, message_from_value,
    validate, BridgeError, ValidationError,
};
pub use messages::*;
pub use policy::{Direction, DirectionPolicy, Peer};
pub use registry::{Dispatch, Handler, HandlerRegistry};
