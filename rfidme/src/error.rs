//! High-level error types

use std::fmt;

use rfidme_core::CommandFamily;
use rfidme_types::DeviceId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Device {0} not found")]
    DeviceNotFound(DeviceId),
    
    #[error("Failed to open device {id}: {source}")]
    OpenFailed {
        id: DeviceId,
        #[source]
        source: rfidme_transport::Error,
    },
    
    #[error("Claim failed while {step}: {source}")]
    ClaimFailed {
        step: ClaimStep,
        #[source]
        source: ClaimError,
    },
    
    #[error("Command {family} failed: {source}")]
    CommandFailed {
        family: CommandFamily,
        #[source]
        source: CommandError,
    },
    
    #[error("Core protocol error: {0}")]
    Core(#[from] rfidme_core::Error),
    
    #[error("Transport error: {0}")]
    Transport(#[from] rfidme_transport::Error),
}

impl Error {
    pub(crate) fn command(family: CommandFamily, source: CommandError) -> Self {
        Self::CommandFailed { family, source }
    }
    
    /// Check if the error ends the session
    ///
    /// Only open and claim failures do; a failed command leaves the session
    /// usable.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound(_) | Self::OpenFailed { .. } | Self::ClaimFailed { .. }
        )
    }
}

/// Command exchange failures
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Short write: {written} of {expected} bytes transferred")]
    WriteMismatch { expected: usize, written: usize },
    
    #[error("Write failed: {0}")]
    Write(#[source] rfidme_transport::Error),
    
    #[error("Read failed after {attempts} attempt(s): {source}")]
    ReadExhausted {
        attempts: u32,
        #[source]
        source: rfidme_transport::Error,
    },
    
    #[error("Malformed response: {0}")]
    Malformed(#[from] rfidme_core::Error),
}

/// Setup step during which a claim failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStep {
    KernelDriver,
    SetConfiguration,
    Reset,
    ClaimInterface,
    ResolveEndpoints,
}

impl fmt::Display for ClaimStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            Self::KernelDriver => "detaching kernel driver",
            Self::SetConfiguration => "setting configuration",
            Self::Reset => "resetting device",
            Self::ClaimInterface => "claiming interface",
            Self::ResolveEndpoints => "resolving endpoints",
        };
        f.write_str(step)
    }
}

/// Cause of a claim failure
#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error(transparent)]
    Transport(#[from] rfidme_transport::Error),
    
    #[error("interface {0} has no OUT/IN endpoint pair")]
    NoEndpoints(u8),
    
    #[error(transparent)]
    Session(#[from] rfidme_core::Error),
}
