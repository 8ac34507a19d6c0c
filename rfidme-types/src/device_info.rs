//! Device identity structures

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// USB vendor/product pair identifying a reader model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceId {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Parses the `vendor:product` hex notation used by `lsusb`, e.g. `1325:c029`.
impl FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (vendor, product) = s
            .split_once(':')
            .ok_or_else(|| Error::MissingSeparator(s.to_string()))?;

        let parse = |part: &str| {
            let digits = part
                .trim()
                .trim_start_matches("0x")
                .trim_start_matches("0X");
            u16::from_str_radix(digits, 16)
                .map_err(|source| Error::InvalidId {
                    part: part.to_string(),
                    source,
                })
        };

        Ok(Self::new(parse(vendor)?, parse(product)?))
    }
}

/// Opened device information
///
/// Identifies the device a session is bound to. Only meaningful while the
/// session that produced it is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Vendor/product identity
    pub id: DeviceId,
    
    /// Bus the device is attached to
    pub bus_number: u8,
    
    /// Address on the bus
    pub address: u8,
}

impl DeviceInfo {
    pub fn new(id: DeviceId, bus_number: u8, address: u8) -> Self {
        Self {
            id,
            bus_number,
            address,
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device[{} bus {:03} addr {:03}]",
            self.id, self.bus_number, self.address
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_parse() {
        let id: DeviceId = "1325:c029".parse().unwrap();
        assert_eq!(id, DeviceId::new(0x1325, 0xC029));

        let id: DeviceId = "0x1325:0xC029".parse().unwrap();
        assert_eq!(id, DeviceId::new(0x1325, 0xC029));
    }

    #[test]
    fn test_device_id_parse_invalid() {
        assert!(matches!(
            "1325".parse::<DeviceId>(),
            Err(Error::MissingSeparator(_))
        ));
        assert!(matches!(
            "1325:zzzz".parse::<DeviceId>(),
            Err(Error::InvalidId { .. })
        ));
        assert!("12345:0001".parse::<DeviceId>().is_err());
    }

    #[test]
    fn test_device_id_display() {
        assert_eq!(DeviceId::new(0x1325, 0xC029).to_string(), "1325:c029");
    }
}
