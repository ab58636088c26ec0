//! Wire format, streaming parser, and atomic serializer for framelink.
//!
//! Every message on the stream is one frame:
//! - A 1-byte encoding tag (`b'j'` structured JSON, `b'b'` raw bytes)
//! - A 1-byte name length followed by the UTF-8 wire name
//! - A 4-byte big-endian payload length followed by the payload
//!
//! [`Parser`] turns an unbounded byte stream into complete frames and
//! [`Serializer`] writes frames without interleaving under concurrency.
//! Callers never see partial reads or buffer management.

pub mod codec;
pub mod error;
pub mod parser;
pub mod serializer;

pub use codec::{
    decode_frame, encode_frame, Encoding, Frame, DEFAULT_MAX_PAYLOAD, MAX_NAME_LEN,
};
pub use error::{FrameError, Result};
pub use parser::Parser;
pub use serializer::Serializer;
