//! BLE GATT profile constants for the Govee H613B bulb
//!
//! The bulb exposes one vendor service with a notify characteristic for
//! state reports and a write characteristic for command frames.

/// Read/notify characteristic: state reports arrive here
pub const READ_CHARACTERISTIC_UUID: &str = "00010203-0405-0607-0809-0a0b0c0d2b10";

/// Write characteristic: command and query frames are written here
pub const WRITE_CHARACTERISTIC_UUID: &str = "00010203-0405-0607-0809-0a0b0c0d2b11";

/// Advertised local name prefix of H613B bulbs
pub const DEVICE_NAME_PREFIX: &str = "GBK_H613B_";

/// Whether an advertised name belongs to an H613B bulb
pub fn is_govee_name(name: &str) -> bool {
    name.starts_with(DEVICE_NAME_PREFIX)
}
