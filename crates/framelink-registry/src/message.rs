use bytes::Bytes;
use framelink_frame::Encoding;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

/// Codec capability of a registered message type.
///
/// Implementations decide once, per type, how values travel on the wire.
/// Structured types get this for free through [`JsonMessage`]; types that
/// are themselves byte sequences implement `Message` directly with
/// [`Encoding::Raw`], which carries the payload verbatim:
///
/// ```
/// use bytes::Bytes;
/// use framelink_registry::{CodecError, Encoding, Message};
///
/// struct Chunk(Vec<u8>);
///
/// impl Message for Chunk {
///     fn encoding() -> Encoding {
///         Encoding::Raw
///     }
///
///     fn encode_payload(&self) -> Result<Bytes, CodecError> {
///         Ok(Bytes::copy_from_slice(&self.0))
///     }
///
///     fn decode_payload(bytes: &[u8]) -> Result<Self, CodecError> {
///         Ok(Chunk(bytes.to_vec()))
///     }
/// }
/// ```
pub trait Message: Send + Sync + 'static {
    /// Wire encoding for values of this type.
    fn encoding() -> Encoding
    where
        Self: Sized;

    /// Encode a value into payload bytes.
    fn encode_payload(&self) -> Result<Bytes, CodecError>;

    /// Decode payload bytes back into a value.
    fn decode_payload(bytes: &[u8]) -> Result<Self, CodecError>
    where
        Self: Sized;
}

/// Marker for types carried as structured JSON documents.
///
/// One line opts a serde type into the wire protocol:
///
/// ```
/// use framelink_registry::JsonMessage;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Hello {
///     content: String,
/// }
///
/// impl JsonMessage for Hello {}
/// ```
pub trait JsonMessage: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<M: JsonMessage> Message for M {
    fn encoding() -> Encoding {
        Encoding::Structured
    }

    fn encode_payload(&self) -> Result<Bytes, CodecError> {
        Ok(serde_json::to_vec(self)?.into())
    }

    fn decode_payload(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
