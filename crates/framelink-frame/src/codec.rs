use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Wire tag for raw byte payloads.
const TAG_RAW: u8 = b'b';
/// Wire tag for structured (JSON) payloads.
const TAG_STRUCTURED: u8 = b'j';

/// Tag byte (1) + name length byte (1).
const PREFIX_SIZE: usize = 2;
/// Big-endian payload length prefix.
const BODY_LEN_SIZE: usize = 4;

/// Maximum wire name length (one-byte length prefix).
pub const MAX_NAME_LEN: usize = 255;

/// Default maximum payload size accepted on the inbound path: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Payload encoding carried in a frame's tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Self-describing JSON document decoded into the registered type.
    Structured,
    /// Payload bytes used verbatim as a byte-sequence value.
    Raw,
}

impl Encoding {
    /// The tag byte written on the wire.
    pub fn tag(self) -> u8 {
        match self {
            Encoding::Structured => TAG_STRUCTURED,
            Encoding::Raw => TAG_RAW,
        }
    }

    /// Map a wire tag back to an encoding.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            TAG_STRUCTURED => Some(Encoding::Structured),
            TAG_RAW => Some(Encoding::Raw),
            _ => None,
        }
    }
}

/// One protocol message: wire name, payload encoding, payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The wire name resolved through the registry on both ends.
    pub name: String,
    /// How the payload bytes are to be interpreted.
    pub encoding: Encoding,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(name: impl Into<String>, encoding: Encoding, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            encoding,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + name + payload).
    pub fn wire_size(&self) -> usize {
        PREFIX_SIZE + self.name.len() + BODY_LEN_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format, all multi-byte integers big-endian:
/// ```text
/// ┌──────────┬─────────────┬────────────────┬──────────────┬─────────────────┐
/// │ Tag (1B) │ NameLen (1B)│ Name           │ BodyLen (4B) │ Body             │
/// │ 'b'/'j'  │             │ (NameLen bytes)│              │ (BodyLen bytes)  │
/// └──────────┴─────────────┴────────────────┴──────────────┴─────────────────┘
/// ```
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    let name = frame.name.as_bytes();
    if name.len() > MAX_NAME_LEN {
        return Err(FrameError::NameTooLong { len: name.len() });
    }
    if frame.payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: frame.payload.len(),
            max: u32::MAX as usize,
        });
    }

    dst.reserve(frame.wire_size());
    dst.put_u8(frame.encoding.tag());
    dst.put_u8(name.len() as u8);
    dst.put_slice(name);
    dst.put_u32(frame.payload.len() as u32);
    dst.put_slice(&frame.payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
///
/// The lengths are self-describing regardless of the tag byte, so a frame
/// with an unknown tag or a non-UTF-8 name is consumed in full before the
/// error is returned; the buffer is left positioned at the next frame and
/// the caller may skip and continue (see [`FrameError::is_frame_local`]).
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < PREFIX_SIZE {
        return Ok(None); // Need more data
    }

    let name_len = src[1] as usize;
    let header = PREFIX_SIZE + name_len + BODY_LEN_SIZE;
    if src.len() < header {
        return Ok(None); // Need more data
    }

    let body_off = PREFIX_SIZE + name_len;
    let body_len = u32::from_be_bytes(src[body_off..body_off + 4].try_into().unwrap()) as usize;

    if body_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: body_len,
            max: max_payload,
        });
    }

    if src.len() < header + body_len {
        return Ok(None); // Need more data
    }

    let tag = src[0];
    src.advance(PREFIX_SIZE);
    let name_bytes = src.split_to(name_len);
    src.advance(BODY_LEN_SIZE);
    let payload = src.split_to(body_len).freeze();

    let encoding = Encoding::from_tag(tag).ok_or(FrameError::UnknownEncoding { tag })?;
    let name = std::str::from_utf8(&name_bytes)
        .map_err(|_| FrameError::InvalidName)?
        .to_string();

    Ok(Some(Frame {
        name,
        encoding,
        payload,
    }))
}
