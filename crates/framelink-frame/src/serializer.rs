use std::io::{ErrorKind, Write};
use std::sync::{Mutex, PoisonError};

use bytes::BytesMut;

use crate::codec::{encode_frame, Frame, DEFAULT_MAX_PAYLOAD};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream, one at a time.
///
/// The internal mutex is held for the full encode-write-flush sequence, so
/// concurrent callers never interleave their bytes on the wire. There is no
/// rollback for a partial write: if the stream fails mid-frame it may be
/// left torn, and the caller must treat that as connection failure.
pub struct Serializer<W> {
    state: Mutex<WriterState<W>>,
}

struct WriterState<W> {
    inner: W,
    buf: BytesMut,
    max_payload: usize,
}

impl<W: Write> Serializer<W> {
    /// Create a serializer with the default payload size limit.
    pub fn new(inner: W) -> Self {
        Self::with_max_payload(inner, DEFAULT_MAX_PAYLOAD)
    }

    /// Create a serializer with an explicit payload size limit.
    pub fn with_max_payload(inner: W, max_payload: usize) -> Self {
        Self {
            state: Mutex::new(WriterState {
                inner,
                buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
                max_payload,
            }),
        }
    }

    /// Encode a frame and write it as one atomic unit (blocking).
    pub fn write_frame(&self, frame: &Frame) -> Result<()> {
        // The scratch buffer is cleared before each use, so state behind a
        // poisoned lock is still consistent; recover and carry on.
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let WriterState {
            inner,
            buf,
            max_payload,
        } = &mut *guard;

        if frame.payload.len() > *max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: frame.payload.len(),
                max: *max_payload,
            });
        }

        buf.clear();
        encode_frame(frame, buf)?;

        let mut offset = 0usize;
        while offset < buf.len() {
            match inner.write(&buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        loop {
            match inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Consume the serializer and return the inner stream.
    pub fn into_inner(self) -> W {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .inner
    }
}
