use framelink_frame::FrameError;
use framelink_registry::CodecError;

/// Errors that can occur in adapter operations.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The message type has no wire name in the registry.
    #[error("message type {0} is not registered")]
    NotRegistered(&'static str),

    /// The adapter has not been bound to a stream yet.
    #[error("adapter not started")]
    NotStarted,

    /// `start` may only be called once per adapter.
    #[error("adapter already started")]
    AlreadyStarted,

    /// The adapter observed its terminal error and is dead.
    #[error("adapter closed")]
    Closed,

    /// Frame-level failure on the stream.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Payload encode/decode failure.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Transport-level I/O failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AdapterError>;
