//! Type definitions for rfidme

pub mod control;
pub mod device_info;
pub mod endpoint;
pub mod error;

pub use control::ControlSetup;
pub use device_info::{DeviceId, DeviceInfo};
pub use endpoint::{Direction, EndpointDescriptor, Endpoints};
pub use error::{Error, Result};
