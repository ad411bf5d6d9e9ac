//! # beam-protocol
//!
//! Wire protocol definitions for the Beam slide-sync service.
//!
//! This crate defines the messages exchanged between clients and the sync
//! hub, serialized as UTF-8 JSON text frames over a WebSocket.
//!
//! ## Frame Types
//!
//! - `Join` - Bind a connection to a session with a declared role
//! - `SlideChange` - Move the session's current slide (client and server direction)
//! - `Participants` - Roster snapshot pushed to presenters
//!
//! ## Example
//!
//! ```rust
//! use beam_protocol::{codec, ServerFrame};
//!
//! let frame = ServerFrame::slide_change(3);
//!
//! let encoded = codec::encode(&frame).unwrap();
//! assert_eq!(encoded, r#"{"type":"slideChange","slideIndex":3}"#);
//! ```

pub mod codec;
pub mod frames;

pub use codec::{decode, encode, ProtocolError};
pub use frames::{ClientFrame, Role, RosterEntry, ServerFrame};
