use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::debug;

use crate::codec::{decode_frame, Frame, DEFAULT_MAX_PAYLOAD};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Incrementally decodes complete frames from any `Read` stream.
///
/// Holds exactly one accumulation buffer; partial reads are handled
/// internally and callers always get complete frames. Frames that are
/// malformed in a frame-local way (unknown tag, bad name) are dropped and
/// parsing continues. Every other failure, including clean end-of-stream,
/// is terminal for the stream.
pub struct Parser<R> {
    inner: R,
    buf: BytesMut,
    max_payload: usize,
}

impl<R: Read> Parser<R> {
    /// Create a parser with the default payload size limit.
    pub fn new(inner: R) -> Self {
        Self::with_max_payload(inner, DEFAULT_MAX_PAYLOAD)
    }

    /// Create a parser with an explicit payload size limit.
    pub fn with_max_payload(inner: R, max_payload: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_payload,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the stream ends,
    /// whether cleanly between frames or mid-frame.
    pub fn next_frame(&mut self) -> Result<Frame> {
        loop {
            match decode_frame(&mut self.buf, self.max_payload) {
                Ok(Some(frame)) => return Ok(frame),
                Ok(None) => {}
                Err(err) if err.is_frame_local() => {
                    debug!(error = %err, "dropping malformed frame");
                    continue;
                }
                Err(err) => return Err(err),
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the parser and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
