//! High-level reader interface

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, trace, warn};

use rfidme_core::{
    constants::{COMMAND_SETUP, DEFAULT_DEVICE, DEFAULT_WRITE_TIMEOUT_MS, READER_INTERFACE},
    response::{interpret_inventory, interpret_power},
    Command, CommandFamily, InventoryOutcome, PowerAck, ResponseFrame, RetryPolicy, Session,
    SessionState,
};
use rfidme_transport::{Transport, UsbTransport};
use rfidme_types::{DeviceId, DeviceInfo, Endpoints};

use crate::error::{ClaimError, ClaimStep, CommandError, Error, Result};
use crate::operation::{Operation, Report};
use crate::retry::RetryReader;

/// RFID ME reader
///
/// Owns the transport and the session for one device. The lifecycle is
/// [`open`](Device::open) → [`claim`](Device::claim) → commands →
/// [`close`](Device::close); `close` must run on every exit path, which
/// [`run`](Device::run) does for you.
///
/// # Examples
///
/// ```no_run
/// use rfidme::Device;
///
/// #[tokio::main]
/// async fn main() -> rfidme::Result<()> {
///     let mut device = Device::new();
///     
///     device.connect().await?;
///     let ack = device.set_antenna_power(0x1E).await;
///     device.close().await?;
///     
///     println!("Power: {:?}", ack?);
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn Transport>,
    session: Session,
    device_id: DeviceId,
    retry_policy: RetryPolicy,
    write_timeout: Duration,
    info: Option<DeviceInfo>,
}

impl Device {
    /// Create a device for the default reader over libusb
    pub fn new() -> Self {
        Self::with_transport(Box::new(UsbTransport::new()))
    }
    
    /// Create a device over a custom transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            session: Session::new(READER_INTERFACE),
            device_id: DEFAULT_DEVICE,
            retry_policy: RetryPolicy::default(),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
            info: None,
        }
    }
    
    /// Set vendor/product identity to look for
    pub fn with_device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = device_id;
        self
    }
    
    /// Set interface number (default: 0)
    pub fn with_interface(mut self, interface: u8) -> Self {
        self.session = Session::new(interface);
        self
    }
    
    /// Set read retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
    
    /// Set control write timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
    
    /// Get current session state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }
    
    /// Check if commands can be sent
    pub fn is_claimed(&self) -> bool {
        self.session.is_claimed()
    }
    
    /// Opened device, if any
    pub fn info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }
    
    /// Find and open the reader
    ///
    /// # Errors
    ///
    /// - [`Error::DeviceNotFound`] if no device matches
    /// - [`Error::OpenFailed`] if the USB stack failed
    pub async fn open(&mut self) -> Result<DeviceInfo> {
        if self.session.is_open() {
            return Err(rfidme_core::Error::InvalidSessionState(format!(
                "Cannot open from state: {:?}",
                self.session.state()
            ))
            .into());
        }
        
        info!("Opening reader {}...", self.device_id);
        
        let info = match self.transport.open(self.device_id).await {
            Ok(Some(info)) => info,
            Ok(None) => return Err(Error::DeviceNotFound(self.device_id)),
            Err(source) => {
                return Err(Error::OpenFailed {
                    id: self.device_id,
                    source,
                });
            }
        };
        
        self.session.open()?;
        info!("Opened {}", info);
        
        self.info = Some(info.clone());
        Ok(info)
    }
    
    /// Take exclusive control of the reader interface
    ///
    /// On failure the session is faulted and whatever was done so far is
    /// undone (interface released, kernel driver reattached) before the error
    /// is returned. [`close`](Device::close) is still required afterwards.
    pub async fn claim(&mut self) -> Result<Endpoints> {
        if self.session.state() != SessionState::Opened {
            return Err(rfidme_core::Error::InvalidSessionState(format!(
                "Cannot claim from state: {:?}",
                self.session.state()
            ))
            .into());
        }
        
        match self.try_claim().await {
            Ok(endpoints) => Ok(endpoints),
            Err((step, source)) => {
                warn!("Claim failed while {}: {}", step, source);
                self.session.fault();
                self.teardown().await;
                Err(Error::ClaimFailed { step, source })
            }
        }
    }
    
    /// Open and claim
    pub async fn connect(&mut self) -> Result<()> {
        self.open().await?;
        self.claim().await?;
        Ok(())
    }
    
    /// Give the device back
    ///
    /// Releases the interface and reattaches the kernel driver if this
    /// session took them, then drops the handle. Cleanup failures are logged,
    /// not returned. Calling it on a closed device does nothing.
    pub async fn close(&mut self) -> Result<()> {
        if !self.session.is_open() {
            return Ok(());
        }
        
        info!("Closing {}...", self.transport.location());
        
        self.teardown().await;
        let disposed = self.transport.dispose().await;
        self.session.close();
        self.info = None;
        
        disposed?;
        
        info!("Closed");
        Ok(())
    }
    
    /// Send a command and collect its reply
    ///
    /// The reply is read in the mode of the command's family and decoded.
    /// Failures are returned as [`Error::CommandFailed`] and leave the
    /// session state untouched.
    pub async fn send_command(&mut self, command: &Command) -> Result<ResponseFrame> {
        let endpoints = self.session.endpoints()?;
        let family = command.family;
        
        self.write(command)
            .await
            .map_err(|e| Error::command(family, e))?;
        
        let raw = RetryReader::new(self.retry_policy, command.response_mode())
            .read(self.transport.as_mut(), &endpoints.response)
            .await
            .map_err(|e| Error::command(family, e))?;
        
        let frame = ResponseFrame::decode(raw, family)
            .map_err(|e| Error::command(family, CommandError::Malformed(e)))?;
        
        debug!("Received {}", frame);
        
        if !frame.is_complete() {
            warn!(
                "{} reply truncated: {} of {:?} bytes",
                family,
                frame.size(),
                frame.declared_length
            );
        }
        
        Ok(frame)
    }
    
    /// Send a command whose reply is not awaited
    pub async fn write_command(&mut self, command: &Command) -> Result<()> {
        self.session.endpoints()?;
        
        self.write(command)
            .await
            .map_err(|e| Error::command(command.family, e))
    }
    
    /// Set antenna port power
    pub async fn set_antenna_power(&mut self, level: u8) -> Result<PowerAck> {
        debug!("Setting antenna power to {}...", level);
        
        let frame = self.send_command(&Command::set_antenna_power(level)).await?;
        let ack = interpret_power(&frame);
        
        match ack {
            PowerAck::Applied => debug!("Antenna power set"),
            PowerAck::Rejected { status, .. } => {
                warn!("Antenna power rejected (status 0x{:02X})", status)
            }
        }
        
        Ok(ack)
    }
    
    /// Run one inventory round
    pub async fn inventory(&mut self) -> Result<InventoryOutcome> {
        debug!("Running inventory...");
        
        let frame = self.send_command(&Command::tag_inventory()).await?;
        
        interpret_inventory(&frame)
            .map_err(|e| Error::command(CommandFamily::TagInventory, CommandError::Malformed(e)))
    }
    
    /// Switch to quick-access mode and read the tag in the field
    ///
    /// Returns the raw reply bytes.
    pub async fn read_tag(&mut self) -> Result<Bytes> {
        debug!("Reading a tag...");
        
        self.write_command(&Command::set_quick_access_mode()).await?;
        let frame = self.send_command(&Command::tag_read()).await?;
        
        Ok(frame.payload)
    }
    
    /// Connect, perform `operation`, and close
    ///
    /// The device is closed whether or not the operation succeeded; the
    /// operation's error wins over a close error.
    pub async fn run(&mut self, operation: Operation) -> Result<Report> {
        let outcome = match self.connect().await {
            Ok(()) => self.perform(operation).await,
            Err(e) => Err(e),
        };
        
        let closed = self.close().await;
        
        let report = outcome?;
        closed?;
        Ok(report)
    }
    
    // Helper methods
    
    async fn perform(&mut self, operation: Operation) -> Result<Report> {
        match operation {
            Operation::Inventory { power } => {
                let power = match power {
                    Some(level) => Some(self.set_antenna_power(level).await?),
                    None => None,
                };
                let outcome = self.inventory().await?;
                Ok(Report::Inventory { power, outcome })
            }
            Operation::SetPower { level } => {
                Ok(Report::Power(self.set_antenna_power(level).await?))
            }
            Operation::ReadTag => Ok(Report::TagData(self.read_tag().await?)),
        }
    }
    
    async fn try_claim(&mut self) -> std::result::Result<Endpoints, (ClaimStep, ClaimError)> {
        let interface = self.session.interface();
        
        let driver_active = match self.transport.kernel_driver_active(interface).await {
            Ok(active) => active,
            // No kernel driver concept on this platform
            Err(e) if e.is_not_supported() => false,
            Err(e) => return Err(at(ClaimStep::KernelDriver)(e)),
        };
        
        if driver_active {
            self.transport
                .detach_kernel_driver(interface)
                .await
                .map_err(at(ClaimStep::KernelDriver))?;
            self.session.record_driver_detached();
        }
        
        self.transport
            .set_configuration()
            .await
            .map_err(at(ClaimStep::SetConfiguration))?;
        
        self.transport
            .reset()
            .await
            .map_err(at(ClaimStep::Reset))?;
        
        self.transport
            .claim_interface(interface)
            .await
            .map_err(at(ClaimStep::ClaimInterface))?;
        self.session.record_interface_claimed();
        
        let descriptors = self
            .transport
            .endpoints(interface)
            .await
            .map_err(at(ClaimStep::ResolveEndpoints))?;
        
        let endpoints = Endpoints::select(&descriptors)
            .ok_or((ClaimStep::ResolveEndpoints, ClaimError::NoEndpoints(interface)))?;
        
        info!("Interface {}: OUT {}", interface, endpoints.command);
        info!("Interface {}: IN {}", interface, endpoints.response);
        
        self.session
            .claimed(endpoints)
            .map_err(|e| (ClaimStep::ResolveEndpoints, ClaimError::Session(e)))?;
        
        Ok(endpoints)
    }
    
    /// Undo claim-time actions; each runs at most once per session
    async fn teardown(&mut self) {
        let teardown = self.session.take_teardown();
        let interface = self.session.interface();
        
        if teardown.release_interface {
            if let Err(e) = self.transport.release_interface(interface).await {
                warn!("Failed to release interface {}: {}", interface, e);
            }
        }
        
        if teardown.reattach_driver {
            if let Err(e) = self.transport.attach_kernel_driver(interface).await {
                warn!("Failed to reattach kernel driver to interface {}: {}", interface, e);
            }
        }
    }
    
    async fn write(&mut self, command: &Command) -> std::result::Result<(), CommandError> {
        let data = command.encode();
        
        debug!("Sending {}", command);
        trace!("Sending: {:?}", command);
        
        let written = self
            .transport
            .control_write(COMMAND_SETUP, &data, self.write_timeout)
            .await
            .map_err(CommandError::Write)?;
        
        if written != data.len() {
            return Err(CommandError::WriteMismatch {
                expected: data.len(),
                written,
            });
        }
        
        Ok(())
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if self.session.is_open() {
            warn!("Device dropped without close(); interface and kernel driver not restored");
        }
    }
}

fn at(step: ClaimStep) -> impl FnOnce(rfidme_transport::Error) -> (ClaimStep, ClaimError) {
    move |e| (step, ClaimError::Transport(e))
}
