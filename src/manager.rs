//! Discovery orchestration.
//!
//! [`DiscoveryManager`] is the public surface of the crate. It walks the
//! precondition chain before a session may start (adapter state, location
//! permissions, location service), treats a trigger during an active
//! session as a cancel, owns the monitor task that interprets relayed
//! events, and exposes the displayable device list and the discovery
//! status as watchable values.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::ble::events::ScanEvent;
use crate::ble::scanner::{BleScanner, DiscoveryControl};
use crate::config::ScanConfig;
use crate::device::DeviceDetails;
use crate::error::{Error, Result};
use crate::monitor::{DiscoveryMonitor, DiscoveryStatus};
use crate::platform::{HostServices, SystemServices, REQUIRED_PERMISSIONS};

/// Outcome of a discovery trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryAction {
    /// A new discovery session was started.
    Started,
    /// The active session was cancelled instead.
    Cancelled,
}

/// Callback handle for unregistering callbacks.
pub struct CallbackHandle {
    id: u64,
    unregister_fn: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CallbackHandle {
    /// Create a new callback handle.
    pub(crate) fn new(id: u64, unregister_fn: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unregister_fn: Some(Box::new(unregister_fn)),
        }
    }

    /// Unregister this callback.
    pub fn unregister(mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }

    /// Get the callback ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }
}

/// Central manager for discovering nearby Bluetooth devices.
pub struct DiscoveryManager {
    /// Platform discovery facade.
    scanner: Arc<dyn DiscoveryControl>,
    /// Permission, location, and settings facilities.
    system: Arc<dyn SystemServices>,
    /// Displayable device list output.
    devices_rx: watch::Receiver<Vec<DeviceDetails>>,
    /// Discovery status output.
    status_rx: watch::Receiver<Option<DiscoveryStatus>>,
    /// Callback ID counter.
    callback_counter: AtomicU64,
    /// Handle to the monitor task.
    monitor_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
    /// Running flag.
    is_running: Arc<AtomicBool>,
}

impl DiscoveryManager {
    /// Create a manager with the default configuration and host platform
    /// services.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        Self::with_config(ScanConfig::default()).await
    }

    /// Create a manager with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn with_config(config: ScanConfig) -> Result<Self> {
        let scanner = BleScanner::new(config.clone()).await?;
        Ok(Self::with_parts(
            Arc::new(scanner),
            Arc::new(HostServices),
            config,
        ))
    }

    /// Assemble a manager from explicit parts.
    ///
    /// Useful for hosts with their own permission and settings plumbing.
    /// Must be called within a tokio runtime: construction spawns the
    /// monitor task that interprets relayed events, scoped to this
    /// manager's lifetime.
    pub fn with_parts(
        scanner: Arc<dyn DiscoveryControl>,
        system: Arc<dyn SystemServices>,
        config: ScanConfig,
    ) -> Self {
        let (devices_tx, devices_rx) = watch::channel(Vec::new());
        let (status_tx, status_rx) = watch::channel(None);

        let is_running = Arc::new(AtomicBool::new(true));

        let handle = tokio::spawn(Self::run_monitor(
            scanner.clone(),
            DiscoveryMonitor::new(devices_tx, status_tx),
            is_running.clone(),
            config.continuous,
        ));

        Self {
            scanner,
            system,
            devices_rx,
            status_rx,
            callback_counter: AtomicU64::new(0),
            monitor_handle: RwLock::new(Some(handle)),
            is_running,
        }
    }

    /// Consume the event slot for as long as the manager lives.
    async fn run_monitor(
        scanner: Arc<dyn DiscoveryControl>,
        mut monitor: DiscoveryMonitor,
        is_running: Arc<AtomicBool>,
        continuous: bool,
    ) {
        let mut events = scanner.events();

        while is_running.load(Ordering::SeqCst) {
            tokio::select! {
                changed = events.changed() => {
                    if changed.is_err() {
                        break;
                    }

                    let event = match events.borrow_and_update().clone() {
                        Some(event) => event,
                        None => continue,
                    };

                    monitor.apply(&event);

                    if continuous
                        && matches!(event, ScanEvent::DiscoveryFinished)
                        && is_running.load(Ordering::SeqCst)
                    {
                        if let Err(e) = scanner.start_discovery().await {
                            warn!("Failed to restart discovery: {}", e);
                        }
                    }
                }
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    // Re-check the running flag
                }
            }
        }

        debug!("Discovery monitor task ended");
    }

    /// Toggle discovery.
    ///
    /// Cancels the active session when one is running; otherwise walks
    /// the precondition chain and starts a new session. Cancelling does
    /// not clear already-displayed results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BluetoothDisabled`], [`Error::PermissionDenied`],
    /// or [`Error::LocationDisabled`] when the corresponding precondition
    /// fails; no session is started in that case.
    pub async fn toggle_discovery(&self) -> Result<DiscoveryAction> {
        if self.scanner.is_discovering() {
            self.scanner.cancel_discovery().await?;
            return Ok(DiscoveryAction::Cancelled);
        }

        if !self.scanner.is_enabled() && !self.system.request_enable_bluetooth().await {
            return Err(Error::BluetoothDisabled);
        }

        self.start_discovery().await?;
        Ok(DiscoveryAction::Started)
    }

    /// Run the precondition chain and start a session.
    ///
    /// Unlike [`toggle_discovery`](Self::toggle_discovery), an
    /// already-active session is left running.
    pub async fn start_discovery(&self) -> Result<()> {
        let missing = REQUIRED_PERMISSIONS
            .iter()
            .any(|p| !self.system.has_permission(*p));

        if missing {
            info!("Requesting discovery permissions");
            if !self.system.request_permissions(&REQUIRED_PERMISSIONS).await {
                return Err(Error::PermissionDenied);
            }
        }

        if self.system.requires_location_service() && !self.system.location_enabled() {
            info!("Requesting location service");
            if !self.system.request_enable_location().await || !self.system.location_enabled() {
                return Err(Error::LocationDisabled);
            }
        }

        if self.scanner.is_enabled() && !self.scanner.is_discovering() {
            self.scanner.start_discovery().await?;
        }

        Ok(())
    }

    /// Watch the displayable device list.
    pub fn devices(&self) -> watch::Receiver<Vec<DeviceDetails>> {
        self.devices_rx.clone()
    }

    /// Watch the discovery status.
    pub fn status(&self) -> watch::Receiver<Option<DiscoveryStatus>> {
        self.status_rx.clone()
    }

    /// Number of devices currently displayed.
    pub fn device_count(&self) -> usize {
        self.devices_rx.borrow().len()
    }

    /// Whether a discovery session is active.
    pub fn is_discovering(&self) -> bool {
        self.scanner.is_discovering()
    }

    /// Register a callback for displayable-list changes.
    pub fn on_devices_changed<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(Vec<DeviceDetails>) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.devices_rx.clone();

        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let devices = rx.borrow_and_update().clone();
                callback(devices);
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }

    /// Register a callback for discovery status changes.
    pub fn on_status_changed<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(DiscoveryStatus) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.status_rx.clone();

        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let status = *rx.borrow_and_update();
                if let Some(status) = status {
                    callback(status);
                }
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }

    /// Clean shutdown: cancel any active session and stop the monitor
    /// task.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down discovery manager");

        if self.scanner.is_discovering() {
            self.scanner.cancel_discovery().await?;
        }

        self.is_running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.monitor_handle.write().take() {
            handle.abort();
            let _ = handle.await;
        }

        Ok(())
    }
}

impl Drop for DiscoveryManager {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.monitor_handle.write().take() {
            handle.abort();
        }
    }
}
