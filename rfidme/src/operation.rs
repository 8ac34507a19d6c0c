//! Reader operations run as one connect/close cycle

use bytes::Bytes;
use rfidme_core::{InventoryOutcome, PowerAck};

/// What to do with the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Optionally set antenna power, then run a tag inventory
    Inventory { power: Option<u8> },
    
    /// Only set antenna power
    SetPower { level: u8 },
    
    /// Quick-access tag read
    ReadTag,
}

/// Result of an [`Operation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Inventory {
        power: Option<PowerAck>,
        outcome: InventoryOutcome,
    },
    Power(PowerAck),
    TagData(Bytes),
}

impl Report {
    /// Check whether the reader accepted everything it was asked to do
    pub fn is_accepted(&self) -> bool {
        match self {
            Self::Inventory { power, outcome } => {
                power.is_none_or(PowerAck::is_applied)
                    && matches!(outcome, InventoryOutcome::Completed(_))
            }
            Self::Power(ack) => ack.is_applied(),
            Self::TagData(_) => true,
        }
    }
}
