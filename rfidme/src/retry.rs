//! Reply collection with retry on timeout
//!
//! In accumulate mode a timeout is how the reader says "that was all": once
//! at least one read has succeeded, the next timeout ends the reply. Before
//! that, each timeout costs one attempt.

use bytes::{Bytes, BytesMut};
use rfidme_core::{ResponseMode, RetryPolicy};
use rfidme_transport::Transport;
use rfidme_types::EndpointDescriptor;
use tracing::{debug, info, trace};

use crate::error::CommandError;

/// Read loop state
#[derive(Debug)]
pub enum ReadState {
    Reading(Reading),
    Succeeded(Bytes),
    Failed {
        attempts: u32,
        source: rfidme_transport::Error,
    },
}

/// Progress while in [`ReadState::Reading`]
#[derive(Debug)]
pub struct Reading {
    mode: ResponseMode,
    remaining: u32,
    issued: u32,
    successes: u32,
    accumulated: BytesMut,
}

impl Reading {
    fn new(mode: ResponseMode, max_attempts: u32) -> Self {
        Self {
            mode,
            remaining: max_attempts.max(1),
            issued: 0,
            successes: 0,
            accumulated: BytesMut::new(),
        }
    }
    
    /// Apply the outcome of one read
    pub fn advance(mut self, result: rfidme_transport::Result<BytesMut>) -> ReadState {
        self.issued += 1;
        
        match (self.mode, result) {
            (ResponseMode::Bounded, Ok(data)) => ReadState::Succeeded(data.freeze()),
            (ResponseMode::Bounded, Err(source)) => ReadState::Failed {
                attempts: self.issued,
                source,
            },
            (ResponseMode::Accumulate, Ok(data)) => {
                if self.successes == 0 {
                    info!("Reply arriving...");
                }
                trace!("Read {} bytes", data.len());
                self.successes += 1;
                self.accumulated.extend_from_slice(&data);
                ReadState::Reading(self)
            }
            (ResponseMode::Accumulate, Err(e)) if e.is_timeout() && self.successes > 0 => {
                debug!(
                    "Reply complete: {} bytes in {} read(s)",
                    self.accumulated.len(),
                    self.successes
                );
                ReadState::Succeeded(self.accumulated.freeze())
            }
            (ResponseMode::Accumulate, Err(e)) if e.is_timeout() => {
                self.remaining -= 1;
                if self.remaining == 0 {
                    ReadState::Failed {
                        attempts: self.issued,
                        source: e,
                    }
                } else {
                    debug!("Read timed out, {} attempt(s) left", self.remaining);
                    ReadState::Reading(self)
                }
            }
            (ResponseMode::Accumulate, Err(source)) => ReadState::Failed {
                attempts: self.issued,
                source,
            },
        }
    }
}

/// Collects one reply from the response endpoint
#[derive(Debug, Clone, Copy)]
pub struct RetryReader {
    policy: RetryPolicy,
    mode: ResponseMode,
}

impl RetryReader {
    pub fn new(policy: RetryPolicy, mode: ResponseMode) -> Self {
        Self { policy, mode }
    }
    
    /// Read until the reply is complete or the policy gives up
    ///
    /// Each read asks for one packet of the endpoint's max size.
    ///
    /// # Errors
    ///
    /// [`CommandError::ReadExhausted`] carrying the last transport error.
    pub async fn read(
        &self,
        transport: &mut dyn Transport,
        endpoint: &EndpointDescriptor,
    ) -> Result<Bytes, CommandError> {
        let max_len = endpoint.max_packet_size as usize;
        let mut state = ReadState::Reading(Reading::new(self.mode, self.policy.max_attempts()));
        
        loop {
            state = match state {
                ReadState::Reading(reading) => {
                    let result = transport
                        .interrupt_read(endpoint.address, max_len, self.policy.timeout())
                        .await;
                    reading.advance(result)
                }
                ReadState::Succeeded(data) => return Ok(data),
                ReadState::Failed { attempts, source } => {
                    return Err(CommandError::ReadExhausted { attempts, source });
                }
            };
        }
    }
}
