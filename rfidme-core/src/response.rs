//! Interpretation of decoded reader replies
//!
//! A reply the reader rejects is a normal outcome here, not an error. Errors
//! are reserved for frames whose layout cannot be honored.

use std::fmt;

use bytes::Bytes;

use crate::{
    command::CommandFamily,
    constants::{inventory, status},
    error::{Error, Result},
    frame::ResponseFrame,
};

/// Antenna power acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAck {
    /// The reader applied the new level
    Applied,
    
    /// The reader answered but refused the command
    Rejected { echo_code: u8, status: u8 },
}

impl PowerAck {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Tag seen during an inventory round
#[derive(Clone, PartialEq, Eq)]
pub struct Tag {
    /// Raw identifier bytes (usually the EPC)
    pub id: Bytes,
}

impl Tag {
    /// Identifier as uppercase hex
    pub fn id_hex(&self) -> String {
        hex::encode_upper(&self.id)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tag").field(&self.id_hex()).finish()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id_hex())
    }
}

/// Result of a successful inventory round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    /// Number of tags the reader reported
    pub tag_count: u8,
    
    /// First tag's identifier, absent when no tag was seen
    pub first_tag: Option<Tag>,
}

/// Inventory reply outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryOutcome {
    Completed(Inventory),
    Rejected { echo_code: u8, status: u8 },
}

/// Interpret an antenna power reply
///
/// Applied iff the echo is 0xC1 and the status is zero.
pub fn interpret_power(frame: &ResponseFrame) -> PowerAck {
    if frame.echo_code == CommandFamily::SetAntennaPortPower.echo_code()
        && frame.status == status::OK
    {
        PowerAck::Applied
    } else {
        PowerAck::Rejected {
            echo_code: frame.echo_code,
            status: frame.status,
        }
    }
}

/// Interpret an inventory reply
///
/// ```text
/// [0x32, --, status, count, len, id[0] .. id[len-1], ...]
/// ```
///
/// # Errors
///
/// [`Error::MalformedResponse`] if the count, length or identifier bytes
/// fall outside the frame.
pub fn interpret_inventory(frame: &ResponseFrame) -> Result<InventoryOutcome> {
    if frame.echo_code != CommandFamily::TagInventory.echo_code() || frame.status != status::OK {
        return Ok(InventoryOutcome::Rejected {
            echo_code: frame.echo_code,
            status: frame.status,
        });
    }
    
    let data = &frame.payload;
    let malformed = |reason: String| Error::MalformedResponse {
        family: CommandFamily::TagInventory,
        reason,
    };
    
    let tag_count = *data.get(inventory::COUNT_OFFSET).ok_or_else(|| {
        malformed(format!("no tag count in {}-byte frame", data.len()))
    })?;
    
    if tag_count == 0 {
        return Ok(InventoryOutcome::Completed(Inventory {
            tag_count,
            first_tag: None,
        }));
    }
    
    let tag_len = *data.get(inventory::TAG_LENGTH_OFFSET).ok_or_else(|| {
        malformed(format!("no tag length in {}-byte frame", data.len()))
    })? as usize;
    
    let end = inventory::TAG_DATA_OFFSET + tag_len;
    if data.len() < end {
        return Err(malformed(format!(
            "tag data needs {} bytes, frame has {}",
            end,
            data.len()
        )));
    }
    
    Ok(InventoryOutcome::Completed(Inventory {
        tag_count,
        first_tag: Some(Tag {
            id: data.slice(inventory::TAG_DATA_OFFSET..end),
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    
    fn frame(family: CommandFamily, raw: &'static [u8]) -> ResponseFrame {
        ResponseFrame::decode(Bytes::from_static(raw), family).unwrap()
    }
    
    #[test]
    fn test_power_applied() {
        let ack = interpret_power(&frame(CommandFamily::SetAntennaPortPower, &[0xC1, 0x03, 0x00]));
        assert_eq!(ack, PowerAck::Applied);
    }
    
    #[test]
    fn test_power_rejected() {
        let ack = interpret_power(&frame(CommandFamily::SetAntennaPortPower, &[0xC1, 0x03, 0x01]));
        assert_eq!(
            ack,
            PowerAck::Rejected {
                echo_code: 0xC1,
                status: 0x01
            }
        );
    }
    
    #[test]
    fn test_power_wrong_echo_is_rejection() {
        let ack = interpret_power(&frame(CommandFamily::SetAntennaPortPower, &[0x5C, 0x03, 0x00]));
        assert!(!ack.is_applied());
    }
    
    #[test]
    fn test_inventory_first_tag() {
        let outcome = interpret_inventory(&frame(
            CommandFamily::TagInventory,
            &[0x32, 0x40, 0x00, 0x02, 0x04, 0xAA, 0xBB, 0xCC, 0xDD],
        ))
        .unwrap();
        
        let InventoryOutcome::Completed(inventory) = outcome else {
            panic!("Expected completed inventory, got {:?}", outcome);
        };
        assert_eq!(inventory.tag_count, 2);
        let tag = inventory.first_tag.unwrap();
        assert_eq!(tag.id.as_ref(), &[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(tag.id_hex(), "AABBCCDD");
    }
    
    #[test]
    fn test_inventory_no_tags() {
        let outcome =
            interpret_inventory(&frame(CommandFamily::TagInventory, &[0x32, 0x40, 0x00, 0x00])).unwrap();
        
        assert_eq!(
            outcome,
            InventoryOutcome::Completed(Inventory {
                tag_count: 0,
                first_tag: None
            })
        );
    }
    
    #[test]
    fn test_inventory_rejected() {
        let outcome =
            interpret_inventory(&frame(CommandFamily::TagInventory, &[0x32, 0x40, 0x05])).unwrap();
        
        assert_eq!(
            outcome,
            InventoryOutcome::Rejected {
                echo_code: 0x32,
                status: 0x05
            }
        );
    }
    
    #[test]
    fn test_inventory_truncated_tag_is_malformed() {
        let result = interpret_inventory(&frame(
            CommandFamily::TagInventory,
            &[0x32, 0x40, 0x00, 0x01, 0x04, 0xAA, 0xBB],
        ));
        
        assert!(matches!(result, Err(Error::MalformedResponse { .. })));
    }
    
    #[test]
    fn test_inventory_missing_count_is_malformed() {
        let result = interpret_inventory(&frame(CommandFamily::TagInventory, &[0x32, 0x40, 0x00]));
        assert!(matches!(result, Err(Error::MalformedResponse { .. })));
    }
}
