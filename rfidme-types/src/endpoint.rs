//! USB endpoint descriptors

use std::fmt;

/// Transfer direction, from the host's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Device to host
    In,
    
    /// Host to device
    Out,
}

impl Direction {
    /// Direction encoded in bit 7 of an endpoint address
    pub fn from_address(address: u8) -> Self {
        if address & 0x80 != 0 {
            Self::In
        } else {
            Self::Out
        }
    }
}

/// Endpoint of the claimed interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub address: u8,
    pub direction: Direction,
    pub max_packet_size: u16,
}

impl EndpointDescriptor {
    pub fn new(address: u8, max_packet_size: u16) -> Self {
        Self {
            address,
            direction: Direction::from_address(address),
            max_packet_size,
        }
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} 0x{:02x} (max size {})",
            self.direction, self.address, self.max_packet_size
        )
    }
}

/// Command (OUT) and response (IN) endpoints, resolved once per claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub command: EndpointDescriptor,
    pub response: EndpointDescriptor,
}

impl Endpoints {
    /// Pick the first OUT and the first IN endpoint of an interface
    pub fn select(descriptors: &[EndpointDescriptor]) -> Option<Self> {
        let command = descriptors
            .iter()
            .find(|e| e.direction == Direction::Out)?;
        let response = descriptors
            .iter()
            .find(|e| e.direction == Direction::In)?;

        Some(Self {
            command: *command,
            response: *response,
        })
    }
}
