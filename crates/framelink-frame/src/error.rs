/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame name exceeds the one-byte length prefix.
    #[error("frame name too long ({len} bytes, max 255)")]
    NameTooLong { len: usize },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The frame carries an encoding tag this implementation does not know.
    #[error("unknown encoding tag 0x{tag:02x}")]
    UnknownEncoding { tag: u8 },

    /// The frame name is not valid UTF-8.
    #[error("frame name is not valid UTF-8")]
    InvalidName,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended; clean closure and mid-frame truncation alike.
    #[error("connection closed (end of stream)")]
    ConnectionClosed,
}

impl FrameError {
    /// True when the error invalidated one frame but not the stream.
    ///
    /// `decode_frame` consumes the offending frame's bytes before returning
    /// these, so the parser can drop the frame and keep reading.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            FrameError::UnknownEncoding { .. } | FrameError::InvalidName
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
