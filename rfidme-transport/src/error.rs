//! Transport errors

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Device not open")]
    NotOpen,
    
    #[error("Device already open")]
    AlreadyOpen,
    
    #[error("Operation timed out")]
    Timeout,
    
    #[error("Interface {0} not found in active configuration")]
    InterfaceNotFound(u8),
    
    #[error("USB error: {0}")]
    Usb(rusb::Error),
    
    #[error("Blocking task failed: {0}")]
    Blocking(String),
}

impl Error {
    /// Check if the transfer simply ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
    
    /// Check if the platform does not support the operation
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::Usb(rusb::Error::NotSupported))
    }
}

impl From<rusb::Error> for Error {
    fn from(e: rusb::Error) -> Self {
        match e {
            rusb::Error::Timeout => Self::Timeout,
            other => Self::Usb(other),
        }
    }
}
