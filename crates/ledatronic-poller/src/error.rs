use ledatronic_frame::FrameError;
use ledatronic_transport::TransportError;

/// Errors that end a poll session or reject a configuration.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// Connecting to the controller failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Reading frames failed; the session is over.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Loading the field schema failed.
    #[error("schema error: {0}")]
    Schema(#[from] ledatronic_schema::SchemaError),

    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PollError {
    /// The controller is not listening.
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, PollError::Transport(err) if err.is_connection_refused())
    }

    /// The open stream failed: closed or reset by the controller, cancelled,
    /// or any other I/O error after connecting. Connect failures are not
    /// interruptions.
    pub fn is_connection_interrupted(&self) -> bool {
        match self {
            PollError::Frame(err) => {
                err.is_connection_interrupted() || matches!(err, FrameError::Io(_))
            }
            PollError::Transport(TransportError::Io(_)) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PollError>;
