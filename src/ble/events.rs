//! Raw discovery events relayed from the platform adapter.

/// A platform event relayed by the scanner.
///
/// The relay forwards every adapter event without interpretation; the
/// discovery monitor decides which variants mean anything. Variants the
/// monitor ignores are still part of the vocabulary so the relay stays a
/// plain pass-through.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanEvent {
    /// A discovery session started.
    DiscoveryStarted,

    /// A discovery session ended, on its own or by cancellation.
    DiscoveryFinished,

    /// A device was seen during the session.
    DeviceFound {
        /// Advertised name, if the platform reported one.
        name: Option<String>,
        /// Device address in string form.
        address: String,
        /// Signal strength in dBm, if reported.
        rssi: Option<i16>,
    },

    /// A device connected. Not part of discovery.
    DeviceConnected {
        /// Platform identifier of the peripheral.
        id: String,
    },

    /// A device disconnected. Not part of discovery.
    DeviceDisconnected {
        /// Platform identifier of the peripheral.
        id: String,
    },

    /// The adapter's power state changed.
    AdapterStateChanged {
        /// Whether the adapter is now powered on.
        powered_on: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_event_clone() {
        // Just verify the enum is Clone
        fn assert_clone<T: Clone>() {}
        assert_clone::<ScanEvent>();
    }

    #[test]
    fn test_device_found_equality() {
        let a = ScanEvent::DeviceFound {
            name: Some("Speaker".to_string()),
            address: "AA:BB:CC:DD:EE:FF".to_string(),
            rssi: Some(-40),
        };

        assert_eq!(a.clone(), a);
        assert_ne!(a, ScanEvent::DiscoveryStarted);
    }
}
