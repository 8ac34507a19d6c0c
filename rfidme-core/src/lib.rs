//! # rfidme-core
//!
//! Core protocol implementation for RFID ME USB readers.
//!
//! This crate provides the low-level protocol primitives:
//! - Command definitions and wire encoding
//! - Response frame decoding
//! - Reply interpretation (power acknowledgement, tag inventory)
//! - Session state and teardown bookkeeping
//! - Retry policy and protocol constants

pub mod command;
pub mod constants;
pub mod error;
pub mod frame;
pub mod response;
pub mod retry;
pub mod session;

pub use command::{Command, CommandFamily, ResponseMode};
pub use error::{Error, Result};
pub use frame::ResponseFrame;
pub use response::{Inventory, InventoryOutcome, PowerAck, Tag};
pub use retry::RetryPolicy;
pub use session::{Session, SessionState, Teardown};
