//! Reader command definitions

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::opcodes;

/// How a command's reply is collected
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResponseMode {
    /// One read with an explicit timeout; the reply fits a single transfer
    Bounded,
    
    /// Concatenate reads until the device goes quiet
    Accumulate,
}

/// Command families understood by the reader
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CommandFamily {
    SetQuickAccessMode,
    SetAntennaPortPower,
    TagInventory,
    TagRead,
}

impl CommandFamily {
    /// All documented families
    pub const ALL: [CommandFamily; 4] = [
        Self::SetQuickAccessMode,
        Self::SetAntennaPortPower,
        Self::TagInventory,
        Self::TagRead,
    ];

    /// Leading command byte
    pub fn opcode(self) -> u8 {
        match self {
            Self::SetQuickAccessMode => opcodes::SET_QUICK_ACCESS_MODE,
            Self::SetAntennaPortPower => opcodes::SET_ANTENNA_PORT_POWER,
            Self::TagInventory => opcodes::TAG_INVENTORY,
            Self::TagRead => opcodes::TAG_READ,
        }
    }

    /// Code the reader echoes back in byte 0 of the reply
    pub fn echo_code(self) -> u8 {
        self.opcode().wrapping_add(1)
    }

    /// Reply collection mode for this family
    ///
    /// Configuration replies are single short frames. Inventory and tag
    /// reads stream an unknown number of reports.
    pub fn response_mode(self) -> ResponseMode {
        match self {
            Self::SetQuickAccessMode | Self::SetAntennaPortPower => ResponseMode::Bounded,
            Self::TagInventory | Self::TagRead => ResponseMode::Accumulate,
        }
    }

    /// Whether the reply carries its own length in the header
    pub fn has_length_header(self) -> bool {
        matches!(self, Self::SetQuickAccessMode | Self::SetAntennaPortPower)
    }

    /// Get family name
    pub fn name(self) -> &'static str {
        match self {
            Self::SetQuickAccessMode => "SET_QUICK_ACCESS_MODE",
            Self::SetAntennaPortPower => "SET_ANTENNA_PORT_POWER",
            Self::TagInventory => "TAG_INVENTORY",
            Self::TagRead => "TAG_READ",
        }
    }
}

impl fmt::Display for CommandFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.opcode())
    }
}

/// A command ready to be written to the reader
///
/// The wire format is the opcode followed by the payload, verbatim. Any
/// length or parameter bytes the reader expects are part of the payload.
///
/// # Examples
///
/// ```
/// use rfidme_core::Command;
///
/// let command = Command::set_quick_access_mode();
/// assert_eq!(command.encode().as_ref(), &[0x5B, 0x03, 0x01]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Command {
    /// Family the command belongs to
    pub family: CommandFamily,
    
    /// Opcode bytes
    pub opcode: Bytes,
    
    /// Parameter bytes
    pub payload: Bytes,
}

impl Command {
    /// Create a command from raw opcode and payload bytes
    pub fn new(
        family: CommandFamily,
        opcode: impl Into<Bytes>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            family,
            opcode: opcode.into(),
            payload: payload.into(),
        }
    }

    /// Switch the reader to quick-access mode (no reply expected)
    pub fn set_quick_access_mode() -> Self {
        Self::new(
            CommandFamily::SetQuickAccessMode,
            Bytes::from_static(&[opcodes::SET_QUICK_ACCESS_MODE]),
            Bytes::from_static(&[0x03, 0x01]),
        )
    }

    /// Set the antenna port power level
    pub fn set_antenna_power(level: u8) -> Self {
        Self::new(
            CommandFamily::SetAntennaPortPower,
            Bytes::from_static(&[opcodes::SET_ANTENNA_PORT_POWER]),
            vec![0x04, 0x00, level],
        )
    }

    /// Start a tag inventory round
    pub fn tag_inventory() -> Self {
        Self::new(
            CommandFamily::TagInventory,
            Bytes::from_static(&[opcodes::TAG_INVENTORY]),
            Bytes::from_static(&[0x03, 0x01]),
        )
    }

    /// Read the tag in the field
    pub fn tag_read() -> Self {
        Self::new(
            CommandFamily::TagRead,
            Bytes::from_static(&[opcodes::TAG_READ]),
            Bytes::from_static(&[0x09, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00]),
        )
    }

    /// Encode to wire bytes: opcode followed by payload
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.len());
        buf.put_slice(&self.opcode);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Encoded length in bytes
    pub fn len(&self) -> usize {
        self.opcode.len() + self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reply collection mode
    pub fn response_mode(&self) -> ResponseMode {
        self.family.response_mode()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("family", &self.family)
            .field("opcode", &hex::encode(&self.opcode))
            .field("payload", &hex::encode(&self.payload))
            .finish()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[len={}]", self.family, self.len())
    }
}
