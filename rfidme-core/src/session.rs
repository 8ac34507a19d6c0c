//! Session state for a reader connection
//!
//! A session tracks:
//! - Lifecycle state (closed, opened, claimed, faulted)
//! - Whether this session detached a kernel driver
//! - Whether this session claimed the interface
//! - The endpoints resolved at claim time
//!
//! It performs no I/O. The device layer asks it what has to be undone with
//! [`Session::take_teardown`], which hands each pending action out once.

use rfidme_types::Endpoints;

use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No device
    Closed,
    
    /// Device found and opened
    Opened,
    
    /// Interface claimed, endpoints resolved, ready for commands
    InterfaceClaimed,
    
    /// An unrecoverable USB error occurred while setting up
    Faulted,
}

/// Actions still owed to the device before it is handed back
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Teardown {
    /// Release the claimed interface
    pub release_interface: bool,
    
    /// Give the interface back to the kernel driver
    pub reattach_driver: bool,
}

impl Teardown {
    pub fn is_empty(&self) -> bool {
        !self.release_interface && !self.reattach_driver
    }
}

/// Session bookkeeping
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    interface: u8,
    driver_detached: bool,
    interface_claimed: bool,
    endpoints: Option<Endpoints>,
}

impl Session {
    /// Create a closed session for the given interface number
    pub fn new(interface: u8) -> Self {
        Self {
            state: SessionState::Closed,
            interface,
            driver_detached: false,
            interface_claimed: false,
            endpoints: None,
        }
    }
    
    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }
    
    /// Interface this session works on
    pub fn interface(&self) -> u8 {
        self.interface
    }
    
    /// Check if a device is held (any state but closed)
    pub fn is_open(&self) -> bool {
        !matches!(self.state, SessionState::Closed)
    }
    
    /// Check if commands may be issued
    pub fn is_claimed(&self) -> bool {
        matches!(self.state, SessionState::InterfaceClaimed)
    }
    
    /// Endpoints for command exchange
    ///
    /// # Errors
    ///
    /// [`Error::NotClaimed`] unless the session is in `InterfaceClaimed`.
    pub fn endpoints(&self) -> Result<Endpoints> {
        match (self.state, self.endpoints) {
            (SessionState::InterfaceClaimed, Some(endpoints)) => Ok(endpoints),
            _ => Err(Error::NotClaimed),
        }
    }
    
    /// Closed → Opened
    pub fn open(&mut self) -> Result<()> {
        if self.state != SessionState::Closed {
            return Err(Error::InvalidSessionState(format!(
                "Cannot open from state: {:?}",
                self.state
            )));
        }
        
        self.state = SessionState::Opened;
        Ok(())
    }
    
    /// Record that this session detached the kernel driver
    pub fn record_driver_detached(&mut self) {
        self.driver_detached = true;
    }
    
    /// Record that this session claimed the interface
    pub fn record_interface_claimed(&mut self) {
        self.interface_claimed = true;
    }
    
    /// Opened → InterfaceClaimed
    pub fn claimed(&mut self, endpoints: Endpoints) -> Result<()> {
        if self.state != SessionState::Opened || !self.interface_claimed {
            return Err(Error::InvalidSessionState(format!(
                "Cannot enter InterfaceClaimed from state: {:?} (claimed={})",
                self.state, self.interface_claimed
            )));
        }
        
        self.endpoints = Some(endpoints);
        self.state = SessionState::InterfaceClaimed;
        Ok(())
    }
    
    /// Any state → Faulted
    pub fn fault(&mut self) {
        self.endpoints = None;
        self.state = SessionState::Faulted;
    }
    
    /// Take the pending teardown actions
    ///
    /// Each action is returned at most once over the session's lifetime; a
    /// second call returns an empty teardown.
    pub fn take_teardown(&mut self) -> Teardown {
        let teardown = Teardown {
            release_interface: self.interface_claimed,
            reattach_driver: self.driver_detached,
        };
        
        self.interface_claimed = false;
        self.driver_detached = false;
        
        teardown
    }
    
    /// Close session
    pub fn close(&mut self) {
        self.interface_claimed = false;
        self.driver_detached = false;
        self.endpoints = None;
        self.state = SessionState::Closed;
    }
}
