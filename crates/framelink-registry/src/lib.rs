//! Type-to-wire-name registry and message codec capability for framelink.
//!
//! A [`Registry`] holds the bijection between application message types and
//! the names that travel on the wire. Registration captures each type's
//! codec capability (the [`Message`] trait) in an erased [`Entry`], so both
//! the outbound path (type → name, encode) and the inbound path (name →
//! type, decode) are plain map lookups with no runtime reflection.
//!
//! A populated registry is read-only and connection-free; wrap it in an
//! `Arc` and share it across every adapter that speaks the same protocol.

pub mod error;
pub mod message;
pub mod registry;

pub use error::{CodecError, RegistryError, Result};
pub use framelink_frame::Encoding;
pub use message::{JsonMessage, Message};
pub use registry::{Entry, Registry};
