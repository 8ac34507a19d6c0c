//! Shared test utilities for integration tests
//!
//! [`ScriptedTransport`] plays back a fixed script of device behaviour and
//! records every call it receives, so tests can assert on exactly what the
//! session did to the device (and in which order).

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;
use rfidme_transport::{Error, Result, Transport};
use rfidme_types::{ControlSetup, DeviceId, DeviceInfo, EndpointDescriptor};

/// OUT endpoint reported by the scripted device
pub const OUT_ADDRESS: u8 = 0x02;

/// IN endpoint reported by the scripted device
pub const IN_ADDRESS: u8 = 0x81;

/// Max packet size of both endpoints
pub const PACKET_SIZE: u16 = 64;

/// Transport call as seen by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open,
    KernelDriverActive,
    DetachKernelDriver,
    AttachKernelDriver,
    SetConfiguration,
    Reset,
    ClaimInterface,
    ReleaseInterface,
    Endpoints,
    ControlWrite(Vec<u8>),
    InterruptRead(u8),
    Dispose,
}

/// Claim-time step the script can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Detach,
    SetConfiguration,
    Reset,
    ClaimInterface,
    Endpoints,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Detach,
        Step::SetConfiguration,
        Step::Reset,
        Step::ClaimInterface,
        Step::Endpoints,
    ];
    
    /// Whether the interface is claimed by the time this step fails
    pub fn after_claim(self) -> bool {
        self == Step::Endpoints
    }
}

/// Outcome of one interrupt read
#[derive(Debug, Clone)]
pub enum Read {
    Data(Vec<u8>),
    Timeout,
    Fail(rusb::Error),
}

/// Recorded calls, shared with the test after the transport is boxed
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().push(call);
    }
    
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }
    
    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }
    
    pub fn reads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::InterruptRead(_)))
            .count()
    }
    
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ControlWrite(data) => Some(data),
                _ => None,
            })
            .collect()
    }
    
    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }
}

/// In-memory reader following a script
pub struct ScriptedTransport {
    present: bool,
    driver_active: bool,
    driver_unsupported: bool,
    fail_at: Option<Step>,
    no_endpoints: bool,
    short_write: bool,
    write_error: bool,
    reads: VecDeque<Read>,
    open: bool,
    log: CallLog,
}

impl ScriptedTransport {
    /// A present reader with a bound kernel driver that never answers
    pub fn new() -> Self {
        Self {
            present: true,
            driver_active: true,
            driver_unsupported: false,
            fail_at: None,
            no_endpoints: false,
            short_write: false,
            write_error: false,
            reads: VecDeque::new(),
            open: false,
            log: CallLog::default(),
        }
    }
    
    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }
    
    pub fn driver_active(mut self, active: bool) -> Self {
        self.driver_active = active;
        self
    }
    
    /// Make the kernel driver query fail as unsupported on this platform
    pub fn kernel_driver_unsupported(mut self) -> Self {
        self.driver_unsupported = true;
        self
    }
    
    pub fn fail_at(mut self, step: Option<Step>) -> Self {
        self.fail_at = step;
        self
    }
    
    pub fn without_endpoints(mut self) -> Self {
        self.no_endpoints = true;
        self
    }
    
    /// Make the next control write transfer one byte less than asked
    pub fn short_write(mut self) -> Self {
        self.short_write = true;
        self
    }
    
    /// Make the next control write fail with a pipe error
    pub fn write_error(mut self) -> Self {
        self.write_error = true;
        self
    }
    
    /// Queue a read outcome; an empty queue reads as a timeout
    pub fn read(mut self, read: Read) -> Self {
        self.reads.push_back(read);
        self
    }
    
    pub fn data(self, bytes: &[u8]) -> Self {
        self.read(Read::Data(bytes.to_vec()))
    }
    
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
    
    fn step(&self, call: Call, step: Step) -> Result<()> {
        self.log.push(call);
        self.ensure_open()?;
        if self.fail_at == Some(step) {
            return Err(Error::Usb(rusb::Error::Pipe));
        }
        Ok(())
    }
    
    fn ensure_open(&self) -> Result<()> {
        if self.open { Ok(()) } else { Err(Error::NotOpen) }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&mut self, id: DeviceId) -> Result<Option<DeviceInfo>> {
        self.log.push(Call::Open);
        if !self.present {
            return Ok(None);
        }
        self.open = true;
        Ok(Some(DeviceInfo::new(id, 1, 7)))
    }
    
    fn is_open(&self) -> bool {
        self.open
    }
    
    async fn kernel_driver_active(&mut self, _interface: u8) -> Result<bool> {
        self.log.push(Call::KernelDriverActive);
        self.ensure_open()?;
        if self.driver_unsupported {
            return Err(Error::Usb(rusb::Error::NotSupported));
        }
        Ok(self.driver_active)
    }
    
    async fn detach_kernel_driver(&mut self, _interface: u8) -> Result<()> {
        self.step(Call::DetachKernelDriver, Step::Detach)
    }
    
    async fn attach_kernel_driver(&mut self, _interface: u8) -> Result<()> {
        self.log.push(Call::AttachKernelDriver);
        self.ensure_open()
    }
    
    async fn set_configuration(&mut self) -> Result<()> {
        self.step(Call::SetConfiguration, Step::SetConfiguration)
    }
    
    async fn reset(&mut self) -> Result<()> {
        self.step(Call::Reset, Step::Reset)
    }
    
    async fn claim_interface(&mut self, _interface: u8) -> Result<()> {
        self.step(Call::ClaimInterface, Step::ClaimInterface)
    }
    
    async fn release_interface(&mut self, _interface: u8) -> Result<()> {
        self.log.push(Call::ReleaseInterface);
        self.ensure_open()
    }
    
    async fn endpoints(&mut self, _interface: u8) -> Result<Vec<EndpointDescriptor>> {
        self.step(Call::Endpoints, Step::Endpoints)?;
        if self.no_endpoints {
            return Ok(vec![EndpointDescriptor::new(IN_ADDRESS, PACKET_SIZE)]);
        }
        Ok(vec![
            EndpointDescriptor::new(IN_ADDRESS, PACKET_SIZE),
            EndpointDescriptor::new(OUT_ADDRESS, PACKET_SIZE),
        ])
    }
    
    async fn control_write(
        &mut self,
        _setup: ControlSetup,
        data: &[u8],
        _timeout: Duration,
    ) -> Result<usize> {
        self.log.push(Call::ControlWrite(data.to_vec()));
        self.ensure_open()?;
        if std::mem::take(&mut self.write_error) {
            return Err(Error::Usb(rusb::Error::Pipe));
        }
        if std::mem::take(&mut self.short_write) {
            return Ok(data.len().saturating_sub(1));
        }
        Ok(data.len())
    }
    
    async fn interrupt_read(
        &mut self,
        endpoint: u8,
        max_len: usize,
        _timeout: Duration,
    ) -> Result<BytesMut> {
        self.log.push(Call::InterruptRead(endpoint));
        self.ensure_open()?;
        match self.reads.pop_front().unwrap_or(Read::Timeout) {
            Read::Data(mut data) => {
                data.truncate(max_len);
                Ok(BytesMut::from(&data[..]))
            }
            Read::Timeout => Err(Error::Timeout),
            Read::Fail(e) => Err(Error::Usb(e)),
        }
    }
    
    async fn dispose(&mut self) -> Result<()> {
        self.log.push(Call::Dispose);
        self.ensure_open()?;
        self.open = false;
        Ok(())
    }
    
    fn location(&self) -> String {
        "scripted".to_string()
    }
}
