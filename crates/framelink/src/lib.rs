//! Typed publish/dispatch messaging over a single byte stream.
//!
//! framelink turns any connected bidirectional byte stream (TCP socket,
//! Unix socket, in-memory duplex) into a typed message channel. Register
//! message types under wire names once, then send values from one end and
//! receive them through typed callbacks on the other:
//!
//! ```
//! use std::sync::Arc;
//!
//! use framelink::registry::{JsonMessage, Registry};
//! use framelink::transport::duplex;
//! use framelink::Adapter;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Hello {
//!     content: String,
//! }
//!
//! impl JsonMessage for Hello {}
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = Registry::new();
//! registry.register::<Hello>("hello")?;
//! let registry = Arc::new(registry);
//!
//! let (left, right) = duplex();
//!
//! let receiver = Adapter::new(Arc::clone(&registry));
//! receiver.on(|hello: &Hello| println!("got: {}", hello.content))?;
//! receiver.start(right)?;
//!
//! let sender = Adapter::new(registry);
//! sender.start(left)?;
//! sender.send(&Hello {
//!     content: "Hello, World!".to_string(),
//! })?;
//! # sender.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Crate structure
//!
//! - [`transport`] — the byte-stream boundary (TCP, Unix sockets, in-memory)
//! - [`frame`] — wire format, streaming parser, atomic serializer
//! - [`registry`] — type↔name bijection and the message codec capability
//! - [`Adapter`] — the dispatch loop tying them together

pub mod adapter;
pub mod error;
pub mod handler;

pub use adapter::Adapter;
pub use error::{AdapterError, Result};
pub use handler::HandlerId;

/// Re-export transport types.
pub mod transport {
    pub use framelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use framelink_frame::*;
}

/// Re-export registry types.
pub mod registry {
    pub use framelink_registry::*;
}
