use thiserror::Error;

#[derive(Error, Debug)]
pub enum FarcallError {
    /// The peer closed the stream mid-frame; carries the byte count still
    /// owed for the current header or payload block.
    #[error("connection closed with {0} bytes left in this frame")]
    ConnectionClosed(usize),

    /// A length header declared a payload above the configured limit.
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    /// Malformed JSON or a missing required field.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote end refused the connection outright.
    #[error("connection refused by {0}")]
    ConnectionRefused(String),

    /// A read or write missed its deadline.
    #[error("timed out while {0}")]
    Timeout(String),

    #[error("connection error: {0}")]
    Connection(String),

    /// A server-side `{"error": ...}` envelope, surfaced to the caller.
    #[error("remote procedure failed: {0}")]
    Remote(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FarcallError>;
