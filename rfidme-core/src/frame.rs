//! Reader response frame decoding

use bytes::Bytes;
use std::fmt;
use tracing::trace;

use crate::{
    command::CommandFamily,
    constants::header,
    error::{Error, Result},
};

/// Decoded reader reply
///
/// # Frame Structure
///
/// ```text
/// ┌─────────────┬─────────────┬─────────────┬─────────────────┐
/// │    Echo     │   Length    │   Status    │      Data       │
/// │   1 byte    │   1 byte    │   1 byte    │     N bytes     │
/// └─────────────┴─────────────┴─────────────┴─────────────────┘
/// ```
///
/// For length-prefixed families the length byte counts the whole frame and
/// `payload` is cut to it. Streaming families (inventory, tag read) carry no
/// usable length and `payload` is everything that was read. In both cases
/// `payload` starts at the echo byte, so protocol offsets index it directly.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use rfidme_core::{CommandFamily, ResponseFrame};
///
/// let raw = Bytes::from_static(&[0xC1, 0x03, 0x00]);
/// let frame = ResponseFrame::decode(raw, CommandFamily::SetAntennaPortPower).unwrap();
/// assert_eq!(frame.echo_code, 0xC1);
/// assert_eq!(frame.status, 0x00);
/// assert_eq!(frame.declared_length, Some(3));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Family of the command that produced this reply
    pub family: CommandFamily,
    
    /// Echoed command code
    pub echo_code: u8,
    
    /// Status byte
    pub status: u8,
    
    /// Frame length declared by the reader, if the family has one
    pub declared_length: Option<usize>,
    
    /// Frame bytes, header included
    pub payload: Bytes,
}

impl ResponseFrame {
    /// Decode accumulated reply bytes
    ///
    /// A buffer shorter than the declared length is accepted and keeps what
    /// arrived; see [`ResponseFrame::is_complete`].
    ///
    /// # Errors
    ///
    /// - [`Error::FrameTooShort`] if echo and status cannot be read
    /// - [`Error::MalformedResponse`] if the declared length is smaller than
    ///   the header itself
    pub fn decode(raw: Bytes, family: CommandFamily) -> Result<Self> {
        if raw.len() < header::SIZE {
            return Err(Error::FrameTooShort {
                family,
                expected: header::SIZE,
                actual: raw.len(),
            });
        }
        
        let echo_code = raw[header::ECHO_OFFSET];
        let status = raw[header::STATUS_OFFSET];
        
        let (declared_length, payload) = if family.has_length_header() {
            let declared = raw[header::LENGTH_OFFSET] as usize;
            if declared < header::SIZE {
                return Err(Error::MalformedResponse {
                    family,
                    reason: format!(
                        "declared length {} is shorter than the {}-byte header",
                        declared,
                        header::SIZE
                    ),
                });
            }
            let end = declared.min(raw.len());
            (Some(declared), raw.slice(..end))
        } else {
            (None, raw)
        };
        
        let frame = Self {
            family,
            echo_code,
            status,
            declared_length,
            payload,
        };
        
        trace!(
            family = family.name(),
            echo = format!("0x{:02X}", echo_code),
            status = format!("0x{:02X}", status),
            data = hex::encode(&frame.payload),
            "Decoded response"
        );
        
        Ok(frame)
    }
    
    /// Check whether every declared byte arrived
    pub fn is_complete(&self) -> bool {
        self.declared_length
            .is_none_or(|declared| self.payload.len() == declared)
    }
    
    /// Get frame size in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

impl fmt::Debug for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFrame")
            .field("family", &self.family)
            .field("echo_code", &format!("0x{:02X}", self.echo_code))
            .field("status", &format!("0x{:02X}", self.status))
            .field("declared_length", &self.declared_length)
            .field("payload", &hex::encode(&self.payload))
            .finish()
    }
}

impl fmt::Display for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response[{}](echo=0x{:02X}, status=0x{:02X}, len={})",
            self.family,
            self.echo_code,
            self.status,
            self.payload.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    
    #[test]
    fn test_decode_length_prefixed() {
        let raw = Bytes::from_static(&[0xC1, 0x03, 0x00]);
        let frame = ResponseFrame::decode(raw, CommandFamily::SetAntennaPortPower).unwrap();
        
        assert_eq!(frame.echo_code, 0xC1);
        assert_eq!(frame.status, 0x00);
        assert_eq!(frame.declared_length, Some(3));
        assert_eq!(frame.payload.as_ref(), &[0xC1, 0x03, 0x00]);
        assert!(frame.is_complete());
    }
    
    #[test]
    fn test_decode_slices_to_declared_length() {
        // HID reports are padded to the endpoint size
        let mut raw = vec![0xC1, 0x03, 0x00];
        raw.resize(64, 0x00);
        
        let frame = ResponseFrame::decode(raw.into(), CommandFamily::SetAntennaPortPower).unwrap();
        assert_eq!(frame.payload.len(), 3);
    }
    
    #[test]
    fn test_decode_tolerates_short_buffer() {
        let raw = Bytes::from_static(&[0x5C, 0x06, 0x00, 0x01]);
        let frame = ResponseFrame::decode(raw, CommandFamily::SetQuickAccessMode).unwrap();
        
        assert_eq!(frame.declared_length, Some(6));
        assert_eq!(frame.payload.len(), 4);
        assert!(!frame.is_complete());
    }
    
    #[test]
    fn test_decode_streaming_keeps_everything() {
        let raw = Bytes::from_static(&[0x32, 0x40, 0x00, 0x02, 0x04, 0xAA, 0xBB, 0xCC, 0xDD]);
        let frame = ResponseFrame::decode(raw.clone(), CommandFamily::TagInventory).unwrap();
        
        assert_eq!(frame.declared_length, None);
        assert_eq!(frame.payload, raw);
        assert!(frame.is_complete());
    }
    
    #[test]
    fn test_decode_too_short() {
        let raw = Bytes::from_static(&[0xC1, 0x03]);
        let result = ResponseFrame::decode(raw, CommandFamily::SetAntennaPortPower);
        
        assert!(matches!(
            result,
            Err(Error::FrameTooShort { expected: 3, actual: 2, .. })
        ));
    }
    
    #[test]
    fn test_decode_declared_length_below_header() {
        let raw = Bytes::from_static(&[0xC1, 0x01, 0x00]);
        let result = ResponseFrame::decode(raw, CommandFamily::SetAntennaPortPower);
        
        assert!(matches!(result, Err(Error::MalformedResponse { .. })));
    }
    
    #[test]
    fn test_expected_echo_survives_encode_decode() {
        for family in CommandFamily::ALL {
            for status in [0x00, 0x01, 0x7F] {
                let echo = Command::new(family, vec![family.echo_code()], vec![0x03, status]);
                let frame = ResponseFrame::decode(echo.encode(), family).unwrap();
                
                assert_eq!(frame.echo_code, family.echo_code(), "{}", family);
                assert_eq!(frame.status, status, "{}", family);
            }
        }
    }
    
    proptest! {
        #[test]
        fn prop_streaming_payload_is_whole_buffer(raw in proptest::collection::vec(any::<u8>(), 3..256)) {
            let frame = ResponseFrame::decode(raw.clone().into(), CommandFamily::TagRead).unwrap();
            prop_assert_eq!(frame.payload.as_ref(), raw.as_slice());
            prop_assert_eq!(frame.echo_code, raw[0]);
            prop_assert_eq!(frame.status, raw[2]);
        }
        
        #[test]
        fn prop_length_prefixed_payload_never_exceeds_declared(
            declared in 3u8..=255,
            tail in proptest::collection::vec(any::<u8>(), 0..300),
        ) {
            let mut raw = vec![0xC1, declared, 0x00];
            raw.extend_from_slice(&tail);
            
            let frame = ResponseFrame::decode(raw.clone().into(), CommandFamily::SetAntennaPortPower).unwrap();
            prop_assert_eq!(frame.payload.len(), (declared as usize).min(raw.len()));
            prop_assert_eq!(frame.is_complete(), raw.len() >= declared as usize);
        }
    }
}
