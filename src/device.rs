//! Discovered device data.

use std::fmt;

/// Details of one discovered Bluetooth peer.
///
/// Equality and hashing are by value; the session device list relies on
/// this to deduplicate repeated sightings of the same peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceDetails {
    /// Advertised device name, or the empty string when the platform did
    /// not report one.
    pub name: String,

    /// Device address in the platform's string form (a MAC address on
    /// most platforms).
    pub address: String,
}

impl DeviceDetails {
    /// Create a new DeviceDetails with the specified values.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// The advertised name, or a placeholder when none was reported.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "(unknown)"
        } else {
            &self.name
        }
    }
}

impl fmt::Display for DeviceDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.display_name(), self.address)
    }
}
