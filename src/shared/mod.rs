//! Shared Module
//!
//! This module contains the transport-agnostic types of the room protocol.
//! Nothing in here touches sockets or storage, so clients and test harnesses
//! can use these types without the `ssr` feature.
//!
//! # Overview
//!
//! - **`message`** - the `Message` envelope, its payload kinds, the handshake
//! - **`codec`** - two-phase decode and encode, the kind registry
//! - **`event`** - presence, typing and delivery-failure frames
//! - **`error`** - `DecodeError`

/// Message envelope
pub mod message;

/// Envelope codec and kind registry
pub mod codec;

/// Outbound room events
pub mod event;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use message::{Handshake, ImageBody, Message, MessageBody, TextBody};
pub use codec::{Inbound, KindClass, TypingBody};
pub use event::RoomEvent;
pub use error::DecodeError;
