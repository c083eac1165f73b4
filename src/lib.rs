// Allow holding locks across await points - we use parking_lot which is designed for this
#![allow(clippy::await_holding_lock)]

//! # bluescan
//!
//! A cross-platform Rust library for discovering nearby Bluetooth
//! devices.
//!
//! Discovery runs in bounded sessions against the host adapter. Every
//! platform event is relayed through a single-slot observable and
//! interpreted by a single state-owning monitor, which publishes a
//! deduplicated, newest-first device list together with a two-state
//! discovery status for a UI to render.
//!
//! ## Features
//!
//! - **Device discovery**: bounded scan sessions over the system adapter
//! - **Deduplicated results**: repeated sightings of the same device
//!   collapse to one entry
//! - **Progressive first scan**: the first session reveals devices as
//!   they arrive; later sessions publish once, at session end
//! - **Toggle semantics**: triggering during an active session cancels it
//! - **Precondition chain**: permission, location-service, and adapter
//!   checks run before any session starts
//! - **Watchable outputs**: device list and status as
//!   `tokio::sync::watch` values, plus callback registration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bluescan::{DiscoveryManager, DiscoveryStatus, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = DiscoveryManager::new().await?;
//!     manager.toggle_discovery().await?;
//!
//!     // Wait for the session to finish
//!     let mut status = manager.status();
//!     while status.changed().await.is_ok() {
//!         if *status.borrow() == Some(DiscoveryStatus::Finished) {
//!             break;
//!         }
//!     }
//!
//!     let devices = manager.devices();
//!     for device in devices.borrow().iter() {
//!         println!("{} [{}]", device.display_name(), device.address);
//!     }
//!
//!     manager.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod config;
pub mod device;
pub mod error;
pub mod manager;
pub mod monitor;
pub mod platform;

// Re-exports for convenience
pub use config::ScanConfig;
pub use device::DeviceDetails;
pub use error::{Error, Result};
pub use manager::{CallbackHandle, DiscoveryAction, DiscoveryManager};
pub use monitor::{DiscoveryMonitor, DiscoveryStatus};

// Re-export commonly used types from submodules
pub use ble::events::ScanEvent;
pub use ble::scanner::{BleScanner, DiscoveryControl};
pub use platform::{HostServices, Permission, SystemServices, REQUIRED_PERMISSIONS};
