//! Transport layer for RFID ME readers
//!
//! Provides USB communication with devices.

pub mod error;
pub mod usb;

pub use error::{Error, Result};
pub use usb::UsbTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use rfidme_types::{ControlSetup, DeviceId, DeviceInfo, EndpointDescriptor};

/// Transport trait for USB access to a reader
///
/// One transport holds at most one open device. Every method other than
/// `open` fails with [`Error::NotOpen`] when no device is open.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the first device matching `id`, or `None` if absent
    async fn open(&mut self, id: DeviceId) -> Result<Option<DeviceInfo>>;
    
    /// Check if a device is open
    fn is_open(&self) -> bool;
    
    /// Check whether a kernel driver is bound to `interface`
    async fn kernel_driver_active(&mut self, interface: u8) -> Result<bool>;
    
    /// Unbind the kernel driver from `interface`
    async fn detach_kernel_driver(&mut self, interface: u8) -> Result<()>;
    
    /// Rebind the kernel driver to `interface`
    async fn attach_kernel_driver(&mut self, interface: u8) -> Result<()>;
    
    /// Activate the device's first configuration
    async fn set_configuration(&mut self) -> Result<()>;
    
    /// Reset the device
    async fn reset(&mut self) -> Result<()>;
    
    /// Claim `interface` for exclusive use
    async fn claim_interface(&mut self, interface: u8) -> Result<()>;
    
    /// Release a claimed `interface`
    async fn release_interface(&mut self, interface: u8) -> Result<()>;
    
    /// Endpoints of `interface` in the active configuration
    async fn endpoints(&mut self, interface: u8) -> Result<Vec<EndpointDescriptor>>;
    
    /// Control transfer to the device; returns bytes written
    async fn control_write(
        &mut self,
        setup: ControlSetup,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize>;
    
    /// Interrupt read of up to `max_len` bytes
    async fn interrupt_read(
        &mut self,
        endpoint: u8,
        max_len: usize,
        timeout: Duration,
    ) -> Result<BytesMut>;
    
    /// Drop the device handle and any resources tied to it
    async fn dispose(&mut self) -> Result<()>;
    
    /// Human-readable location of the device
    fn location(&self) -> String;
}
