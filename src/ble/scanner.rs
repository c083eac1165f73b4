//! Discovery sessions and the platform event relay.
//!
//! The scanner owns the platform adapter and runs bounded discovery
//! sessions. While a session is active, a relay task forwards every
//! adapter event into a single-slot watch cell; the cell holds only the
//! latest event (last-write-wins, no buffering).

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CentralState, Manager as _, Peripheral as _, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::stream::{Stream, StreamExt};
use parking_lot::RwLock;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::ble::events::ScanEvent;
use crate::config::ScanConfig;
use crate::error::{Error, Result};

/// Interval at which the relay task re-checks the discovering flag.
const FLAG_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The platform discovery facade: start/cancel discovery, the enabled and
/// discovering queries, and a handle on the relayed event slot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscoveryControl: Send + Sync {
    /// Whether the adapter is powered on.
    fn is_enabled(&self) -> bool;

    /// Whether a discovery session is currently active.
    fn is_discovering(&self) -> bool;

    /// Start a discovery session. No-op when one is already active.
    async fn start_discovery(&self) -> Result<()>;

    /// Cancel the active discovery session. No-op when idle.
    async fn cancel_discovery(&self) -> Result<()>;

    /// Subscribe to the single-slot event cell.
    fn events(&self) -> watch::Receiver<Option<ScanEvent>>;
}

/// Scanner for discovering nearby Bluetooth devices.
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
    /// Session configuration.
    config: ScanConfig,
    /// Adapter power state, tracked from platform state updates.
    powered: Arc<RwLock<bool>>,
    /// Whether a discovery session is currently active.
    is_discovering: Arc<RwLock<bool>>,
    /// Single-slot cell holding the most recently relayed event.
    event_tx: watch::Sender<Option<ScanEvent>>,
    /// Handle to the relay task.
    relay_handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl BleScanner {
    /// Create a new scanner on the first available adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new(config: ScanConfig) -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self::with_adapter(adapter, config))
    }

    /// Create a new scanner with a specific adapter.
    pub fn with_adapter(adapter: Adapter, config: ScanConfig) -> Self {
        let (event_tx, _) = watch::channel(None);

        Self {
            adapter,
            config,
            powered: Arc::new(RwLock::new(true)),
            is_discovering: Arc::new(RwLock::new(false)),
            event_tx,
            relay_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Relay loop for one discovery session.
    ///
    /// Runs until the session duration elapses, discovery is cancelled,
    /// or the adapter event stream closes; then stops the scan and
    /// publishes the finished event.
    async fn relay_session(
        mut events: Pin<Box<dyn Stream<Item = CentralEvent> + Send>>,
        adapter: Adapter,
        powered: Arc<RwLock<bool>>,
        is_discovering: Arc<RwLock<bool>>,
        event_tx: watch::Sender<Option<ScanEvent>>,
        session: Duration,
    ) {
        let deadline = tokio::time::sleep(session);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    if let Err(e) = adapter.stop_scan().await {
                        debug!("Failed to stop scan at session end: {}", e);
                    }
                    break;
                }
                event = events.next() => {
                    match event {
                        Some(event) => {
                            Self::forward_event(event, &adapter, &powered, &event_tx).await;
                        }
                        None => break,
                    }
                }
                _ = tokio::time::sleep(FLAG_POLL_INTERVAL) => {
                    // Cancelled from outside
                    if !*is_discovering.read() {
                        break;
                    }
                }
            }
        }

        *is_discovering.write() = false;
        event_tx.send_replace(Some(ScanEvent::DiscoveryFinished));

        debug!("Discovery session ended");
    }

    /// Forward one adapter event into the relay slot.
    ///
    /// Every event is forwarded; interpretation is left to the monitor.
    async fn forward_event(
        event: CentralEvent,
        adapter: &Adapter,
        powered: &Arc<RwLock<bool>>,
        event_tx: &watch::Sender<Option<ScanEvent>>,
    ) {
        match event {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                trace!("Device seen: {:?}", id);
                if let Some(found) = Self::found_event(adapter, id).await {
                    event_tx.send_replace(Some(found));
                }
            }
            CentralEvent::ManufacturerDataAdvertisement { id, .. }
            | CentralEvent::ServiceDataAdvertisement { id, .. }
            | CentralEvent::ServicesAdvertisement { id, .. } => {
                trace!("Advertisement from: {:?}", id);
                if let Some(found) = Self::found_event(adapter, id).await {
                    event_tx.send_replace(Some(found));
                }
            }
            CentralEvent::DeviceConnected(id) => {
                event_tx.send_replace(Some(ScanEvent::DeviceConnected { id: id.to_string() }));
            }
            CentralEvent::DeviceDisconnected(id) => {
                event_tx.send_replace(Some(ScanEvent::DeviceDisconnected { id: id.to_string() }));
            }
            CentralEvent::StateUpdate(state) => {
                let powered_on = matches!(state, CentralState::PoweredOn);
                *powered.write() = powered_on;
                event_tx.send_replace(Some(ScanEvent::AdapterStateChanged { powered_on }));
            }
        }
    }

    /// Build a device-found event from a peripheral's current properties.
    ///
    /// A sighting whose peripheral or properties cannot be read is
    /// skipped rather than relayed without a payload.
    async fn found_event(adapter: &Adapter, id: PeripheralId) -> Option<ScanEvent> {
        let peripheral = match adapter.peripheral(&id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                return None;
            }
        };

        let properties = match peripheral.properties().await {
            Ok(Some(p)) => p,
            _ => return None,
        };

        Some(ScanEvent::DeviceFound {
            name: properties.local_name,
            address: properties.address.to_string(),
            rssi: properties.rssi,
        })
    }
}

#[async_trait]
impl DiscoveryControl for BleScanner {
    fn is_enabled(&self) -> bool {
        *self.powered.read()
    }

    fn is_discovering(&self) -> bool {
        *self.is_discovering.read()
    }

    async fn start_discovery(&self) -> Result<()> {
        if *self.is_discovering.read() {
            debug!("Already discovering, ignoring start request");
            return Ok(());
        }

        info!("Starting discovery session");

        // Register for adapter events before the scan begins so nothing
        // emitted during startup is missed.
        let events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        *self.is_discovering.write() = true;
        self.event_tx.send_replace(Some(ScanEvent::DiscoveryStarted));

        let adapter = self.adapter.clone();
        let powered = self.powered.clone();
        let is_discovering = self.is_discovering.clone();
        let event_tx = self.event_tx.clone();
        let session = self.config.session_duration;

        let handle = tokio::spawn(Self::relay_session(
            events,
            adapter,
            powered,
            is_discovering,
            event_tx,
            session,
        ));

        *self.relay_handle.write() = Some(handle);

        Ok(())
    }

    async fn cancel_discovery(&self) -> Result<()> {
        if !*self.is_discovering.read() {
            debug!("Not discovering, ignoring cancel request");
            return Ok(());
        }

        info!("Cancelling discovery session");

        *self.is_discovering.write() = false;

        self.adapter.stop_scan().await.map_err(Error::Bluetooth)?;

        // Wait for the relay task to publish the finished event and exit
        if let Some(handle) = self.relay_handle.write().take() {
            let _ = handle.await;
        }

        Ok(())
    }

    fn events(&self) -> watch::Receiver<Option<ScanEvent>> {
        self.event_tx.subscribe()
    }
}

impl Drop for BleScanner {
    fn drop(&mut self) {
        *self.is_discovering.write() = false;
    }
}
