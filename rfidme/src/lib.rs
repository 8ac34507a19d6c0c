//! # rfidme
//!
//! Rust driver for RFID ME USB readers.
//!
//! ## Features
//!
//! - Exclusive session with kernel-driver detach and guaranteed restore
//! - Fixed-format command frames over HID control transfers
//! - Reply collection that tolerates partial reads and timeouts
//! - Typed power acknowledgement and tag inventory results
//!
//! ## Quick Start
//!
//! ```no_run
//! use rfidme::{Device, Operation, Report};
//!
//! #[tokio::main]
//! async fn main() -> rfidme::Result<()> {
//!     let mut device = Device::new();
//!     
//!     // Connects, runs the inventory, and always closes
//!     let report = device.run(Operation::Inventory { power: Some(0x1E) }).await?;
//!     
//!     if let Report::Inventory { outcome, .. } = report {
//!         println!("{:?}", outcome);
//!     }
//!     
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;
pub mod operation;
pub mod retry;

// Re-exports
pub use device::Device;
pub use error::{ClaimError, ClaimStep, CommandError, Error, Result};
pub use operation::{Operation, Report};
pub use retry::RetryReader;

// Re-export types
pub use rfidme_core::{
    Command, CommandFamily, Inventory, InventoryOutcome, PowerAck, ResponseFrame, RetryPolicy,
    SessionState, Tag,
};
pub use rfidme_types::{DeviceId, DeviceInfo, EndpointDescriptor, Endpoints};
