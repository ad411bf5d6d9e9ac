//! Frame types for the Beam protocol.
//!
//! Frames are the messages exchanged between clients and the sync hub.
//! Inbound and outbound directions are separate enums because the hub never
//! echoes a client frame verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a connection declares when joining a session.
///
/// Exactly one presenter per session is expected but not enforced; multiple
/// presenters are tolerated and slide position resolves last-write-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Originates slide-change events and receives roster updates.
    Presenter,
    /// Passively follows slide-change events.
    Participant,
}

impl Role {
    /// Get the wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Presenter => "presenter",
            Role::Participant => "participant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single roster entry in a `participants` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Participant record id.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl RosterEntry {
    /// Create a new roster entry.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Frames sent from clients to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    /// Bind this connection to a session. Must be the first frame a
    /// connection sends; anything received before it is dropped.
    #[serde(rename = "join", rename_all = "camelCase")]
    Join {
        /// Session to join.
        session_id: String,
        /// Declared role, immutable once set.
        role: Role,
    },

    /// Move the session's current slide index.
    #[serde(rename = "slideChange", rename_all = "camelCase")]
    SlideChange {
        /// Target session.
        session_id: String,
        /// New slide index. Not bounds-checked by the hub; an out-of-range
        /// index is forwarded as-is and left to the client rendering layer.
        slide_index: u32,
    },
}

impl ClientFrame {
    /// Get the wire name of the frame, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ClientFrame::Join { .. } => "join",
            ClientFrame::SlideChange { .. } => "slideChange",
        }
    }

    /// Create a new Join frame.
    #[must_use]
    pub fn join(session_id: impl Into<String>, role: Role) -> Self {
        ClientFrame::Join {
            session_id: session_id.into(),
            role,
        }
    }

    /// Create a new SlideChange frame.
    #[must_use]
    pub fn slide_change(session_id: impl Into<String>, slide_index: u32) -> Self {
        ClientFrame::SlideChange {
            session_id: session_id.into(),
            slide_index,
        }
    }
}

/// Frames sent from the hub to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    /// The session's current slide index, sent as the join snapshot and on
    /// every slide change.
    #[serde(rename = "slideChange", rename_all = "camelCase")]
    SlideChange {
        /// Current slide index.
        slide_index: u32,
    },

    /// Roster snapshot, ordered by join time ascending.
    #[serde(rename = "participants")]
    Participants {
        /// Every participant recorded for the session.
        participants: Vec<RosterEntry>,
    },
}

impl ServerFrame {
    /// Get the wire name of the frame, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ServerFrame::SlideChange { .. } => "slideChange",
            ServerFrame::Participants { .. } => "participants",
        }
    }

    /// Create a new SlideChange frame.
    #[must_use]
    pub fn slide_change(slide_index: u32) -> Self {
        ServerFrame::SlideChange { slide_index }
    }

    /// Create a new Participants frame.
    #[must_use]
    pub fn participants(participants: Vec<RosterEntry>) -> Self {
        ServerFrame::Participants { participants }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(Role::Presenter.as_str(), "presenter");
        assert_eq!(Role::Participant.to_string(), "participant");
    }

    #[test]
    fn test_frame_kind() {
        let join = ClientFrame::join("s1", Role::Presenter);
        assert_eq!(join.kind(), "join");

        let change = ServerFrame::slide_change(2);
        assert_eq!(change.kind(), "slideChange");
    }

    #[test]
    fn test_client_frame_json_shape() {
        let frame = ClientFrame::join("abc", Role::Participant);
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(
            json,
            r#"{"type":"join","sessionId":"abc","role":"participant"}"#
        );

        let frame = ClientFrame::slide_change("abc", 7);
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(
            json,
            r#"{"type":"slideChange","sessionId":"abc","slideIndex":7}"#
        );
    }

    #[test]
    fn test_server_frame_json_shape() {
        let frame = ServerFrame::slide_change(0);
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"type":"slideChange","slideIndex":0}"#);

        let frame = ServerFrame::participants(vec![RosterEntry::new("p1", "Kim")]);
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(
            json,
            r#"{"type":"participants","participants":[{"id":"p1","name":"Kim"}]}"#
        );
    }
}
