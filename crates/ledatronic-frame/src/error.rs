/// Errors that can occur while reading or writing status frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The peer closed the stream before the requested bytes arrived.
    #[error("connection interrupted (received {received} of {expected} bytes)")]
    ConnectionInterrupted { expected: usize, received: usize },

    /// A payload handed to the encoder does not have the fixed frame length.
    #[error("payload length {actual} does not match frame payload length {expected}")]
    PayloadLength { expected: usize, actual: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True when the stream ended or was shut down mid-read.
    pub fn is_connection_interrupted(&self) -> bool {
        matches!(self, FrameError::ConnectionInterrupted { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
