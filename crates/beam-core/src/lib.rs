//! # beam-core
//!
//! Core session state and realtime routing for the Beam slide-sync service.
//!
//! This crate provides the fundamental building blocks:
//!
//! - **ConnectionRegistry** - Which live connections belong to which session, and their roles
//! - **BroadcastHub** - Join handshakes, slide-change application, and fan-out
//! - **SessionStore** - Abstract session/participant/slide state, with an in-process implementation
//! - **code** - Human-readable join code generation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌────────────────────┐
//! │  Connection │────▶│ BroadcastHub │────▶│ ConnectionRegistry │
//! └─────────────┘     └──────────────┘     └────────────────────┘
//!                            │
//!                            ▼
//!                     ┌──────────────┐
//!                     │ SessionStore │
//!                     └──────────────┘
//! ```
//!
//! The hub is the only writer of live-session state: every join, slide
//! change, and teardown flows through it, and it alone decides which subset
//! of registered connections a frame fans out to.

pub mod code;
pub mod hub;
pub mod registry;
pub mod store;

pub use hub::BroadcastHub;
pub use registry::{ClientHandle, ConnectionId, ConnectionRegistry, RegistryStats, RoleFilter};
pub use store::{
    MemoryStore, NewParticipant, NewSession, NewSlide, Participant, Session, SessionStore, Slide,
};
