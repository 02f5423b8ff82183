//! Network error types for the wire codec and sessions.

use std::io;
use thiserror::Error;

use crate::game::RoundError;

/// A buffer that doesn't belong to this protocol, or doesn't fit the
/// message the channel expects.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ProtocolViolation {
    #[error("expected {expected} bytes, got {actual}")]
    WrongSize { expected: usize, actual: usize },

    #[error("bad magic cookie {0:#010x}")]
    BadMagic(u32),

    #[error("expected message type {expected:#04x}, got {actual:#04x}")]
    WrongType { expected: u8, actual: u8 },

    #[error("unknown decision {0:?}")]
    UnknownDecision(String),

    #[error("unknown result code {0}")]
    UnknownResultCode(u8),

    #[error("invalid card (rank {rank}, suit {suit})")]
    InvalidCard { rank: u16, suit: u8 },
}

/// Everything a session can end with besides finishing normally.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    #[error(transparent)]
    Round(#[from] RoundError),

    #[error("timed out waiting for peer")]
    Timeout,

    #[error("peer disconnected")]
    Disconnected,

    #[error("zero rounds requested")]
    NoRounds,

    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for SessionError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Disconnected,
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Io(error),
        }
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
