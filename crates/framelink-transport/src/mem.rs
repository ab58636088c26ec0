use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use tracing::debug;

use crate::traits::Transport;

/// One direction of a duplex pair: a byte queue plus its wakeup signal.
#[derive(Debug, Default)]
struct Channel {
    state: Mutex<Buffer>,
    readable: Condvar,
}

#[derive(Debug, Default)]
struct Buffer {
    data: VecDeque<u8>,
    closed: bool,
}

/// In-memory bidirectional byte stream.
///
/// Bytes written to one end become readable on the other. Reads block until
/// data arrives or the stream is shut down; buffered data is still drained
/// after shutdown, then reads report end-of-stream. Behaves like a connected
/// socket pair without touching the network, which makes it the transport of
/// choice for tests and same-process adapter wiring.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    read: Arc<Channel>,
    write: Arc<Channel>,
}

/// Create a connected pair of in-memory streams.
pub fn duplex() -> (MemoryStream, MemoryStream) {
    let a = Arc::new(Channel::default());
    let b = Arc::new(Channel::default());
    (
        MemoryStream {
            read: Arc::clone(&a),
            write: Arc::clone(&b),
        },
        MemoryStream { read: b, write: a },
    )
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        // The buffer is a plain byte queue; a poisoned lock still guards
        // consistent state, so recover instead of failing the read.
        let mut state = self
            .read
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        loop {
            if !state.data.is_empty() {
                let n = buf.len().min(state.data.len());
                for slot in buf.iter_mut().take(n) {
                    *slot = state.data.pop_front().unwrap_or_default();
                }
                return Ok(n);
            }
            if state.closed {
                return Ok(0);
            }
            state = self
                .read
                .readable
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .write
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if state.closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "memory stream shut down",
            ));
        }

        state.data.extend(buf);
        self.write.readable.notify_all();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MemoryStream {
    fn try_clone(&self) -> io::Result<Self> {
        Ok(self.clone())
    }

    fn shutdown(&self) -> io::Result<()> {
        for channel in [&self.read, &self.write] {
            let mut state = channel
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.closed = true;
            channel.readable.notify_all();
        }
        debug!("memory stream shut down");
        Ok(())
    }
}
