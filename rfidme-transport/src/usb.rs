//! USB transport over libusb
//!
//! libusb calls block, so each one runs on the blocking thread pool with the
//! device handle behind a mutex.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;
use rfidme_types::{ControlSetup, DeviceId, DeviceInfo, EndpointDescriptor};
use rusb::{Context, DeviceHandle, UsbContext};
use tokio::task;
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

type SharedHandle = Arc<Mutex<DeviceHandle<Context>>>;

/// libusb-backed transport
pub struct UsbTransport {
    handle: Option<SharedHandle>,
    info: Option<DeviceInfo>,
}

impl UsbTransport {
    /// Create new USB transport
    pub fn new() -> Self {
        Self {
            handle: None,
            info: None,
        }
    }
    
    /// Run a libusb call against the open handle
    async fn with_handle<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut DeviceHandle<Context>) -> rusb::Result<T> + Send + 'static,
    {
        let handle = self.handle.clone().ok_or(Error::NotOpen)?;
        
        task::spawn_blocking(move || {
            let mut guard = handle.lock();
            op(&mut *guard)
        })
        .await
        .map_err(|e| Error::Blocking(e.to_string()))?
        .map_err(Error::from)
    }
}

impl Default for UsbTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UsbTransport {
    async fn open(&mut self, id: DeviceId) -> Result<Option<DeviceInfo>> {
        if self.is_open() {
            return Err(Error::AlreadyOpen);
        }
        
        debug!("Looking for device {}...", id);
        
        let opened = task::spawn_blocking(move || -> rusb::Result<_> {
            let context = Context::new()?;
            let Some(handle) = context.open_device_with_vid_pid(id.vendor_id, id.product_id) else {
                return Ok(None);
            };
            
            let device = handle.device();
            let info = DeviceInfo::new(id, device.bus_number(), device.address());
            Ok(Some((handle, info)))
        })
        .await
        .map_err(|e| Error::Blocking(e.to_string()))??;
        
        let Some((handle, info)) = opened else {
            debug!("Device {} not present", id);
            return Ok(None);
        };
        
        debug!("Opened {}", info);
        
        self.handle = Some(Arc::new(Mutex::new(handle)));
        self.info = Some(info.clone());
        Ok(Some(info))
    }
    
    fn is_open(&self) -> bool {
        self.handle.is_some()
    }
    
    async fn kernel_driver_active(&mut self, interface: u8) -> Result<bool> {
        self.with_handle(move |handle| handle.kernel_driver_active(interface))
            .await
    }
    
    async fn detach_kernel_driver(&mut self, interface: u8) -> Result<()> {
        debug!("Detaching kernel driver from interface {}", interface);
        self.with_handle(move |handle| handle.detach_kernel_driver(interface))
            .await
    }
    
    async fn attach_kernel_driver(&mut self, interface: u8) -> Result<()> {
        debug!("Reattaching kernel driver to interface {}", interface);
        self.with_handle(move |handle| handle.attach_kernel_driver(interface))
            .await
    }
    
    async fn set_configuration(&mut self) -> Result<()> {
        self.with_handle(|handle| {
            let config = handle.device().config_descriptor(0)?;
            debug!("Setting configuration {}", config.number());
            handle.set_active_configuration(config.number())
        })
        .await
    }
    
    async fn reset(&mut self) -> Result<()> {
        debug!("Resetting device");
        self.with_handle(|handle| handle.reset()).await
    }
    
    async fn claim_interface(&mut self, interface: u8) -> Result<()> {
        debug!("Claiming interface {}", interface);
        self.with_handle(move |handle| handle.claim_interface(interface))
            .await
    }
    
    async fn release_interface(&mut self, interface: u8) -> Result<()> {
        debug!("Releasing interface {}", interface);
        self.with_handle(move |handle| handle.release_interface(interface))
            .await
    }
    
    async fn endpoints(&mut self, interface: u8) -> Result<Vec<EndpointDescriptor>> {
        let endpoints = self
            .with_handle(move |handle| {
                let config = handle.device().active_config_descriptor()?;
                
                // Alternate setting 0 is the only one the reader has
                let endpoints = config
                    .interfaces()
                    .find(|i| i.number() == interface)
                    .and_then(|i| i.descriptors().next())
                    .map(|descriptor| {
                        descriptor
                            .endpoint_descriptors()
                            .map(|e| EndpointDescriptor::new(e.address(), e.max_packet_size()))
                            .collect::<Vec<_>>()
                    });
                
                Ok(endpoints)
            })
            .await?;
        
        endpoints.ok_or(Error::InterfaceNotFound(interface))
    }
    
    async fn control_write(
        &mut self,
        setup: ControlSetup,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize> {
        trace!(
            "Control write {} bytes: {:02X?}",
            data.len(),
            &data[..data.len().min(32)]
        );
        
        let data = data.to_vec();
        self.with_handle(move |handle| {
            handle.write_control(
                setup.request_type,
                setup.request,
                setup.value,
                setup.index,
                &data,
                timeout,
            )
        })
        .await
    }
    
    async fn interrupt_read(
        &mut self,
        endpoint: u8,
        max_len: usize,
        timeout: Duration,
    ) -> Result<BytesMut> {
        let buf = self
            .with_handle(move |handle| {
                let mut buf = BytesMut::zeroed(max_len);
                let n = handle.read_interrupt(endpoint, &mut buf, timeout)?;
                buf.truncate(n);
                Ok(buf)
            })
            .await?;
        
        trace!(
            "Received {} bytes from 0x{:02x}: {:02X?}",
            buf.len(),
            endpoint,
            &buf[..buf.len().min(32)]
        );
        
        Ok(buf)
    }
    
    async fn dispose(&mut self) -> Result<()> {
        if self.handle.take().is_some() {
            debug!("Disposing {}", self.location());
        }
        
        self.info = None;
        Ok(())
    }
    
    fn location(&self) -> String {
        self.info
            .as_ref()
            .map(|info| info.to_string())
            .unwrap_or_else(|| "<no device>".to_string())
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        if self.is_open() {
            warn!("USB transport dropped while device still open");
        }
    }
}
