//! Optional restriction of message directions per peer.
//!
//! The contract assigns each message type a conventional sender (see
//! [`MessageType::conventional_sender`]), but the bridges only validate the
//! envelope: either peer may send or receive any of the five types.  That
//! stays the default ([`DirectionPolicy::permissive`]).
//!
//! A deployment that wants the stricter behaviour builds its bridge with
//! [`DirectionPolicy::conventional`], which only lets a peer send the types it
//! conventionally sends and receive the types the other side sends.  Sender
//! identity is still never checked.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::codec::BridgeError;
use crate::protocol::messages::MessageType;

/// The two sides of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Peer {
    /// The native shell embedding the browser surface.
    Host,
    /// The web content running inside the surface.
    Hosted,
}

impl Peer {
    /// The opposite peer.
    pub fn other(self) -> Peer {
        match self {
            Peer::Host => Peer::Hosted,
            Peer::Hosted => Peer::Host,
        }
    }
}

/// Whether a message is leaving or arriving at a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("inbound"),
            Direction::Outbound => f.write_str("outbound"),
        }
    }
}

/// Allowed message types per direction.  `None` means "any type".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionPolicy {
    inbound: Option<BTreeSet<MessageType>>,
    outbound: Option<BTreeSet<MessageType>>,
}

impl DirectionPolicy {
    /// Allows every type in both directions.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Allows only the contract's conventional directions for `peer`.
    pub fn conventional(peer: Peer) -> Self {
        let sent_by = |sender: Peer| {
            MessageType::ALL
                .into_iter()
                .filter(|t| t.conventional_sender() == sender)
                .collect::<BTreeSet<_>>()
        };
        Self {
            inbound: Some(sent_by(peer.other())),
            outbound: Some(sent_by(peer)),
        }
    }

    /// Returns `true` if `message_type` may travel in `direction`.
    pub fn allows(&self, direction: Direction, message_type: MessageType) -> bool {
        let allowed = match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        };
        allowed.as_ref().map_or(true, |set| set.contains(&message_type))
    }

    /// Like [`allows`](Self::allows) but produces the bridge error.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DirectionNotAllowed`] when the type is filtered.
    pub fn check(&self, direction: Direction, message_type: MessageType) -> Result<(), BridgeError> {
        if self.allows(direction, message_type) {
            Ok(())
        } else {
            Err(BridgeError::DirectionNotAllowed {
                message_type,
                direction,
            })
        }
    }

    /// Returns `true` when no direction is restricted.
    pub fn is_permissive(&self) -> bool {
        self.inbound.is_none() && self.outbound.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissive_policy_allows_everything() {
        let policy = DirectionPolicy::permissive();
        for t in MessageType::ALL {
            assert!(policy.allows(Direction::Inbound, t));
            assert!(policy.allows(Direction::Outbound, t));
        }
        assert!(policy.is_permissive());
    }

    #[test]
    fn test_conventional_host_policy() {
        let policy = DirectionPolicy::conventional(Peer::Host);

        assert!(policy.allows(Direction::Outbound, MessageType::RfidResult));
        assert!(policy.allows(Direction::Inbound, MessageType::ScanRfid));
        assert!(!policy.allows(Direction::Outbound, MessageType::ScanRfid));
        assert!(!policy.allows(Direction::Inbound, MessageType::ScannerStatus));
    }

    #[test]
    fn test_conventional_hosted_policy_mirrors_host() {
        let host = DirectionPolicy::conventional(Peer::Host);
        let hosted = DirectionPolicy::conventional(Peer::Hosted);
        for t in MessageType::ALL {
            assert_eq!(
                host.allows(Direction::Outbound, t),
                hosted.allows(Direction::Inbound, t)
            );
        }
    }

    #[test]
    fn test_check_reports_direction_error() {
        let policy = DirectionPolicy::conventional(Peer::Hosted);
        let err = policy
            .check(Direction::Outbound, MessageType::RfidResult)
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::DirectionNotAllowed {
                message_type: MessageType::RfidResult,
                direction: Direction::Outbound
            }
        ));
        assert_eq!(err.to_string(), "RFID_RESULT is not allowed outbound on this peer");
    }
}
