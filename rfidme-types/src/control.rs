//! Control transfer setup

/// Setup fields of a control transfer, minus the data stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSetup {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
}

impl ControlSetup {
    /// HID class SET_REPORT to interface 0 (host-to-device, class, interface)
    pub const SET_REPORT: Self = Self {
        request_type: 0x21,
        request: 0x09,
        value: 0,
        index: 0,
    };
}
