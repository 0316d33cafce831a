//! Error types for transfer construction and transmission.

use std::io;
use thiserror::Error;

/// Errors that can occur while building, fragmenting or dispatching a transfer.
#[derive(Error, Debug)]
pub enum TxError {
    /// Content does not fit in the 16-bit length field of the payload.
    #[error("Payload too large: {size} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    /// A fixed-width payload field was given the wrong number of bytes.
    #[error("Invalid field length: expected {expected} bytes, got {actual}")]
    InvalidFieldLength { expected: usize, actual: usize },

    /// Maximum fragment size must be at least one byte.
    #[error("Invalid fragment size: {0}")]
    InvalidFragmentSize(usize),

    /// The dispatch deadline is not after the current time.
    #[error("Deadline is not in the future")]
    DeadlineInPast,

    /// The output session did not acknowledge before the deadline.
    #[error("Operation timed out")]
    Timeout,

    /// The output session reported a fault.
    #[error("Transport failure: {0}")]
    TransportFailure(#[from] SessionError),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Encoded payload too short to contain its header.
    #[error("Message too short: expected at least {expected} bytes, got {actual}")]
    MessageTooShort { expected: usize, actual: usize },

    /// Encoded payload length prefix disagrees with the available content.
    #[error("Length mismatch: length field says {declared} bytes, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// Frame header failed validation.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// I/O error while setting up a transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Faults reported by an output session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The transfer payload exceeds the session's admission bound.
    #[error("Payload of {size} bytes exceeds session bound of {bound} bytes")]
    PayloadExceedsBound { size: usize, bound: usize },

    /// A single frame would not fit in one datagram.
    #[error("Frame of {size} bytes exceeds MTU of {mtu} bytes")]
    FrameExceedsMtu { size: usize, mtu: usize },

    /// The frame index would overflow its 31-bit field.
    #[error("Transfer needs {0} frames, more than a frame index can address")]
    TooManyFrames(usize),

    /// The deadline passed before every frame was handed to the network.
    #[error("Deadline elapsed during transmission")]
    DeadlineElapsed,

    /// The session (or its consumer) has gone away.
    #[error("Session closed")]
    Closed,
}

/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, TxError>;

impl TxError {
    /// Create a new invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new invalid header error.
    pub fn invalid_header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }

    /// Check if this error is transient.
    ///
    /// Nothing in this crate retries; this is a hint for caller retry policy.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::TransportFailure(SessionError::Io(e)) | Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}
