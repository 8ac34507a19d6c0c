//! Protocol constants

use rfidme_types::{ControlSetup, DeviceId};

/// RFID ME reader vendor id
pub const DEFAULT_VENDOR_ID: u16 = 0x1325;

/// RFID ME reader product id
pub const DEFAULT_PRODUCT_ID: u16 = 0xC029;

/// Identity of the supported reader (1325:c029)
pub const DEFAULT_DEVICE: DeviceId = DeviceId::new(DEFAULT_VENDOR_ID, DEFAULT_PRODUCT_ID);

/// The reader exposes a single HID interface
pub const READER_INTERFACE: u8 = 0;

/// Commands are written as HID output reports
pub const COMMAND_SETUP: ControlSetup = ControlSetup::SET_REPORT;

/// Default number of read attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default per-attempt read timeout (milliseconds)
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Default control write timeout (milliseconds)
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 1000;

/// Response header layout
pub mod header {
    /// Echoed command code
    pub const ECHO_OFFSET: usize = 0;
    
    /// Frame length, header included (length-prefixed families only)
    pub const LENGTH_OFFSET: usize = 1;
    
    /// Status byte, 0x00 on success
    pub const STATUS_OFFSET: usize = 2;
    
    /// Bytes needed before echo and status can be read
    pub const SIZE: usize = 3;
}

/// Status codes
pub mod status {
    pub const OK: u8 = 0x00;
}

/// Command opcodes
///
/// The reader answers every command with `opcode + 1` in the echo byte.
pub mod opcodes {
    pub const SET_QUICK_ACCESS_MODE: u8 = 0x5B;
    pub const SET_ANTENNA_PORT_POWER: u8 = 0xC0;
    pub const TAG_INVENTORY: u8 = 0x31;
    pub const TAG_READ: u8 = 0x37;
}

/// Tag inventory reply layout
pub mod inventory {
    /// Number of tags seen
    pub const COUNT_OFFSET: usize = 3;
    
    /// Length of the first tag's data block
    pub const TAG_LENGTH_OFFSET: usize = 4;
    
    /// First byte of the first tag's identifier
    pub const TAG_DATA_OFFSET: usize = 5;
}
