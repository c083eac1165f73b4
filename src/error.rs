//! Error types for the bluescan crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available on this system.
    #[error("Bluetooth not available")]
    BluetoothUnavailable,

    /// The adapter is disabled and the enable prompt was declined.
    #[error("Enabling Bluetooth is required to scan for devices")]
    BluetoothDisabled,

    /// A required location permission was denied.
    #[error("Location permission is necessary to scan for devices")]
    PermissionDenied,

    /// The platform requires an enabled location service for discovery
    /// and it was left disabled.
    #[error("Enabling location is required to scan for devices")]
    LocationDisabled,
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
