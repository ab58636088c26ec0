use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

/// A connected bidirectional byte stream the adapter can run over.
///
/// The adapter splits one logical connection into three handles: a read half
/// owned by the dispatch thread, a write half owned by the serializer, and a
/// handle kept for `close`. `try_clone` produces those handles; all clones
/// refer to the same underlying stream.
///
/// `shutdown` must terminate both directions so that a read blocked on the
/// stream wakes up with an error or end-of-stream.
pub trait Transport: Read + Write + Send + Sized + 'static {
    /// Create another handle to the same stream.
    fn try_clone(&self) -> std::io::Result<Self>;

    /// Shut down both directions of the stream.
    fn shutdown(&self) -> std::io::Result<()>;
}

impl Transport for TcpStream {
    fn try_clone(&self) -> std::io::Result<Self> {
        TcpStream::try_clone(self)
    }

    fn shutdown(&self) -> std::io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

#[cfg(unix)]
impl Transport for std::os::unix::net::UnixStream {
    fn try_clone(&self) -> std::io::Result<Self> {
        std::os::unix::net::UnixStream::try_clone(self)
    }

    fn shutdown(&self) -> std::io::Result<()> {
        std::os::unix::net::UnixStream::shutdown(self, Shutdown::Both)
    }
}
