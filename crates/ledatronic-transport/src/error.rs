/// Errors that can occur while establishing or using the device link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The host name could not be resolved to a socket address.
    #[error("failed to resolve {addr}: {source}")]
    Resolve {
        addr: String,
        source: std::io::Error,
    },

    /// Nobody is listening on the target address.
    #[error("connection refused by {addr}")]
    ConnectionRefused { addr: String },

    /// Failed to connect for any other reason.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on the established stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// True when the peer actively refused the connection.
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, TransportError::ConnectionRefused { .. })
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
