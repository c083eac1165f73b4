//! Discovery state aggregation.
//!
//! The monitor is the single owner of discovery state. It interprets the
//! events the scanner relays, keeps the per-session device list
//! deduplicated and newest-first, and publishes the displayable list and
//! the discovery status through watch cells.

use tokio::sync::watch;
use tracing::trace;

use crate::ble::events::ScanEvent;
use crate::device::DeviceDetails;

/// Whether a discovery session is currently active.
///
/// The initial state is unset; both transitions are driven by relayed
/// platform events, never by a timer or other internal logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiscoveryStatus {
    /// A session is running.
    Started,
    /// The last session has ended.
    Finished,
}

/// Interprets relayed scan events into displayable state.
pub struct DiscoveryMonitor {
    /// Devices accumulated during the current session.
    session_devices: Vec<DeviceDetails>,
    /// Whether the very first session of this process is still running.
    first_discovery: bool,
    /// Publishes the displayable device list.
    devices_tx: watch::Sender<Vec<DeviceDetails>>,
    /// Publishes the discovery status.
    status_tx: watch::Sender<Option<DiscoveryStatus>>,
}

impl DiscoveryMonitor {
    /// Create a monitor publishing into the given cells.
    pub fn new(
        devices_tx: watch::Sender<Vec<DeviceDetails>>,
        status_tx: watch::Sender<Option<DiscoveryStatus>>,
    ) -> Self {
        Self {
            session_devices: Vec::new(),
            first_discovery: true,
            devices_tx,
            status_tx,
        }
    }

    /// Interpret one relayed event.
    ///
    /// Events outside the discovery vocabulary are ignored.
    pub fn apply(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::DiscoveryFinished => self.finish_session(),
            ScanEvent::DiscoveryStarted => {
                self.status_tx.send_replace(Some(DiscoveryStatus::Started));
            }
            ScanEvent::DeviceFound { name, address, .. } => {
                self.record_device(DeviceDetails::new(
                    name.clone().unwrap_or_default(),
                    address.clone(),
                ));
            }
            _ => {}
        }
    }

    /// Insert a device at the front of the session list unless a
    /// value-equal entry is already present.
    fn record_device(&mut self, details: DeviceDetails) {
        if self.session_devices.contains(&details) {
            trace!("Duplicate sighting ignored: {}", details.address);
            return;
        }

        self.session_devices.insert(0, details);

        // The first session reveals devices as they arrive; later
        // sessions publish only when the session finishes.
        if self.first_discovery {
            self.devices_tx.send_replace(self.session_devices.clone());
        }
    }

    /// Flush the session list into the displayable list and reset for
    /// the next session.
    fn finish_session(&mut self) {
        let devices = std::mem::take(&mut self.session_devices);
        self.devices_tx.send_replace(devices);
        self.status_tx.send_replace(Some(DiscoveryStatus::Finished));
        self.first_discovery = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn found(name: &str, address: &str) -> ScanEvent {
        ScanEvent::DeviceFound {
            name: Some(name.to_string()),
            address: address.to_string(),
            rssi: None,
        }
    }

    fn new_monitor() -> (
        DiscoveryMonitor,
        watch::Receiver<Vec<DeviceDetails>>,
        watch::Receiver<Option<DiscoveryStatus>>,
    ) {
        let (devices_tx, devices_rx) = watch::channel(Vec::new());
        let (status_tx, status_rx) = watch::channel(None);
        (
            DiscoveryMonitor::new(devices_tx, status_tx),
            devices_rx,
            status_rx,
        )
    }

    #[test]
    fn test_duplicates_collapse_newest_first() {
        let (mut monitor, devices, _status) = new_monitor();

        monitor.apply(&ScanEvent::DiscoveryStarted);
        monitor.apply(&found("a", "AA"));
        monitor.apply(&found("b", "BB"));
        monitor.apply(&found("a", "AA"));
        monitor.apply(&ScanEvent::DiscoveryFinished);

        assert_eq!(
            *devices.borrow(),
            vec![DeviceDetails::new("b", "BB"), DeviceDetails::new("a", "AA")]
        );
    }

    #[test]
    fn test_missing_name_stored_as_empty() {
        let (mut monitor, devices, _status) = new_monitor();

        monitor.apply(&ScanEvent::DeviceFound {
            name: None,
            address: "AA".to_string(),
            rssi: Some(-40),
        });
        monitor.apply(&ScanEvent::DiscoveryFinished);

        assert_eq!(*devices.borrow(), vec![DeviceDetails::new("", "AA")]);
    }

    #[test]
    fn test_first_session_publishes_progressively() {
        let (mut monitor, devices, _status) = new_monitor();

        monitor.apply(&ScanEvent::DiscoveryStarted);

        monitor.apply(&found("a", "AA"));
        assert_eq!(*devices.borrow(), vec![DeviceDetails::new("a", "AA")]);

        monitor.apply(&found("b", "BB"));
        assert_eq!(
            *devices.borrow(),
            vec![DeviceDetails::new("b", "BB"), DeviceDetails::new("a", "AA")]
        );
    }

    #[test]
    fn test_later_sessions_publish_only_on_finish() {
        let (mut monitor, devices, _status) = new_monitor();

        // First session runs to completion
        monitor.apply(&ScanEvent::DiscoveryStarted);
        monitor.apply(&found("a", "AA"));
        monitor.apply(&ScanEvent::DiscoveryFinished);

        // Second session: nothing is published until it finishes
        monitor.apply(&ScanEvent::DiscoveryStarted);
        monitor.apply(&found("b", "BB"));
        assert_eq!(*devices.borrow(), vec![DeviceDetails::new("a", "AA")]);

        monitor.apply(&found("c", "CC"));
        assert_eq!(*devices.borrow(), vec![DeviceDetails::new("a", "AA")]);

        monitor.apply(&ScanEvent::DiscoveryFinished);
        assert_eq!(
            *devices.borrow(),
            vec![DeviceDetails::new("c", "CC"), DeviceDetails::new("b", "BB")]
        );
    }

    #[test]
    fn test_started_leaves_displayed_list_unchanged() {
        let (mut monitor, devices, status) = new_monitor();

        monitor.apply(&ScanEvent::DiscoveryStarted);
        monitor.apply(&found("a", "AA"));
        monitor.apply(&ScanEvent::DiscoveryFinished);

        monitor.apply(&ScanEvent::DiscoveryStarted);

        assert_eq!(*devices.borrow(), vec![DeviceDetails::new("a", "AA")]);
        assert_eq!(*status.borrow(), Some(DiscoveryStatus::Started));
    }

    #[test]
    fn test_finish_clears_session_accumulator() {
        let (mut monitor, devices, _status) = new_monitor();

        monitor.apply(&ScanEvent::DiscoveryStarted);
        monitor.apply(&found("a", "AA"));
        monitor.apply(&ScanEvent::DiscoveryFinished);

        // A session with no sightings flushes an empty list
        monitor.apply(&ScanEvent::DiscoveryStarted);
        monitor.apply(&ScanEvent::DiscoveryFinished);

        assert_eq!(*devices.borrow(), Vec::<DeviceDetails>::new());
    }

    #[test]
    fn test_status_transitions() {
        let (mut monitor, _devices, status) = new_monitor();

        assert_eq!(*status.borrow(), None);

        monitor.apply(&ScanEvent::DiscoveryStarted);
        assert_eq!(*status.borrow(), Some(DiscoveryStatus::Started));

        monitor.apply(&ScanEvent::DiscoveryFinished);
        assert_eq!(*status.borrow(), Some(DiscoveryStatus::Finished));
    }

    #[test]
    fn test_non_discovery_events_ignored() {
        let (mut monitor, devices, status) = new_monitor();

        monitor.apply(&ScanEvent::DeviceConnected {
            id: "aa".to_string(),
        });
        monitor.apply(&ScanEvent::DeviceDisconnected {
            id: "aa".to_string(),
        });
        monitor.apply(&ScanEvent::AdapterStateChanged { powered_on: false });

        assert_eq!(*devices.borrow(), Vec::<DeviceDetails>::new());
        assert_eq!(*status.borrow(), None);
    }

    proptest! {
        #[test]
        fn prop_flushed_list_dedup_newest_first(
            addresses in proptest::collection::vec(0u8..8, 0..40)
        ) {
            let (mut monitor, devices, _status) = new_monitor();

            monitor.apply(&ScanEvent::DiscoveryStarted);
            for a in &addresses {
                monitor.apply(&found("dev", &format!("{:02X}", a)));
            }
            monitor.apply(&ScanEvent::DiscoveryFinished);

            let flushed = devices.borrow().clone();

            let mut seen = std::collections::HashSet::new();
            for device in &flushed {
                prop_assert!(seen.insert(device.clone()));
            }

            // Reverse of first-occurrence order
            let mut expected: Vec<String> = Vec::new();
            for a in &addresses {
                let address = format!("{:02X}", a);
                if !expected.contains(&address) {
                    expected.push(address);
                }
            }
            expected.reverse();

            let got: Vec<String> = flushed.iter().map(|d| d.address.clone()).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
