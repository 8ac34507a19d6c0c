//! Error types for rfidme-core

use crate::command::CommandFamily;

/// Result type alias for rfidme-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reply is too short to hold a header
    #[error("{family} reply too short: expected at least {expected} bytes, got {actual} bytes")]
    FrameTooShort {
        family: CommandFamily,
        expected: usize,
        actual: usize,
    },
    
    /// Reply structure cannot be honored
    #[error("Malformed {family} reply: {reason}")]
    MalformedResponse {
        family: CommandFamily,
        reason: String,
    },
    
    /// Invalid session state transition
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
    
    /// Command issued before the interface was claimed
    #[error("Interface not claimed - open and claim the device first")]
    NotClaimed,
}

impl Error {
    /// Check if the error comes from decoding a reply
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. } | Self::MalformedResponse { .. }
        )
    }
}
